/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT

NOTE: Structures and functions for handling the attribute table contained
in the .dbf file that accompanies a Shapefile.
*/
use crate::error::{Result, ShapefileError};
use chrono::prelude::*;
use indexmap::IndexMap;
use shapefile_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::fmt;
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};

/// One attribute row, keyed by field name in schema order.
pub type AttributeRow = IndexMap<String, FieldData>;

/// Name of the pseudo-field carrying a row's deletion flag.
pub const DELETED_FIELD: &str = "deleted";

#[derive(Debug, Default, Clone)]
pub struct AttributeHeader {
    pub version: u8,
    pub year: u32,
    pub month: u8,
    pub day: u8,
    pub num_records: u32,
    pub num_fields: u32, // not actually stored in file but derived
    pub bytes_in_header: u16,
    pub bytes_in_record: u16,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DateData {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl fmt::Display for DateData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Int(i32),
    Int64(i64),
    Real(f64),
    Text(String),
    Date(DateData),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldData::Int(v) => write!(f, "{}", v),
            FieldData::Int64(v) => write!(f, "{}", v),
            FieldData::Real(v) => write!(f, "{}", v),
            FieldData::Text(v) => write!(f, "{}", v),
            FieldData::Date(v) => write!(f, "{}", v),
            FieldData::Bool(v) => write!(f, "{}", if *v { "T" } else { "F" }),
            FieldData::Null => Ok(()),
        }
    }
}

/// A column of the attribute table: name (at most 10 bytes), dBase type
/// character (`C`, `N`, `F`, `L`, `D`), width and decimal count.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AttributeField {
    pub name: String,
    pub field_type: char,
    pub field_length: u8,
    pub decimal_count: u8,
}

impl AttributeField {
    pub fn new(name: &str, field_type: char, field_length: u8, decimal_count: u8) -> AttributeField {
        AttributeField {
            name: name.to_string(),
            field_type: field_type,
            field_length: field_length,
            decimal_count: decimal_count,
        }
    }
}

/// Row-level access to an attribute table. Record numbers are 1-based.
pub trait AttributeStore {
    fn num_records(&self) -> usize;

    /// The row for `record_number` keyed by field name, plus a `deleted`
    /// entry holding 1 for rows flagged as deleted and 0 otherwise.
    fn get_record_with_names(&self, record_number: u32) -> Option<AttributeRow>;

    fn replace_record(&mut self, values: Vec<FieldData>, record_number: u32) -> Result<()>;

    fn add_record(&mut self, values: Vec<FieldData>) -> Result<()>;
}

/// An in-memory dBase III table bound to a file on disk. Opened tables are
/// read-only; created tables are written back when closed.
pub struct DbaseFile {
    pub header: AttributeHeader,
    fields: Vec<AttributeField>,
    data: Vec<Vec<FieldData>>,
    deleted: Vec<bool>,
    path: PathBuf,
    writable: bool,
}

impl DbaseFile {
    /// Opens an existing table for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DbaseFile> {
        let buffer = fs::read(path.as_ref())?;
        let mut bor = ByteOrderReader::new(Cursor::new(buffer), Endianness::LittleEndian)?;
        let (header, fields) = read_table_header(&mut bor)?;

        let mut dbf = DbaseFile {
            header: header,
            fields: fields,
            data: vec![],
            deleted: vec![],
            path: path.as_ref().to_path_buf(),
            writable: false,
        };

        bor.seek(dbf.header.bytes_in_header as usize)
            .map_err(dbase_truncated)?;
        for _ in 0..dbf.header.num_records {
            let deleted = bor.read_u8().map_err(dbase_truncated)? == 0x2A;
            let mut r: Vec<FieldData> = Vec::with_capacity(dbf.fields.len());
            for field in &dbf.fields {
                let str_rep = bor
                    .read_utf8(field.field_length as usize)
                    .map_err(dbase_truncated)?
                    .replace(char::from(0), "")
                    .trim()
                    .to_string();
                r.push(parse_value(field, &str_rep));
            }
            dbf.data.push(r);
            dbf.deleted.push(deleted);
        }
        Ok(dbf)
    }

    /// Creates an empty table with the given fields, replacing any existing
    /// file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, fields: &[AttributeField]) -> Result<DbaseFile> {
        let create_error = |reason: String| ShapefileError::DbaseCreate {
            path: path.as_ref().display().to_string(),
            reason: reason,
        };
        if fields.is_empty() {
            return Err(create_error("a table needs at least one field".to_string()));
        }
        let mut fields = fields.to_vec();
        for field in fields.iter_mut() {
            if field.name.is_empty() || field.name.len() > 10 {
                return Err(create_error(format!(
                    "invalid field name \"{}\"",
                    field.name
                )));
            }
            match field.field_type.to_ascii_uppercase() {
                'D' => field.field_length = 8,
                'L' => field.field_length = 1,
                'C' | 'N' | 'F' => {}
                other => {
                    return Err(create_error(format!(
                        "unsupported field type '{}' for field \"{}\"",
                        other, field.name
                    )));
                }
            }
            field.field_type = field.field_type.to_ascii_uppercase();
            if field.field_length == 0 {
                return Err(create_error(format!(
                    "field \"{}\" has zero length",
                    field.name
                )));
            }
        }
        let dbf = DbaseFile {
            header: AttributeHeader {
                version: 3,
                num_fields: fields.len() as u32,
                ..Default::default()
            },
            fields: fields,
            data: vec![],
            deleted: vec![],
            path: path.as_ref().to_path_buf(),
            writable: true,
        };
        dbf.write()
            .map_err(|e| create_error(e.to_string()))?;
        Ok(dbf)
    }

    pub fn fields(&self) -> &[AttributeField] {
        &self.fields
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the table, writing it back to disk if it was created for
    /// writing.
    pub fn close(self) -> Result<()> {
        if self.writable {
            self.write()?;
        }
        Ok(())
    }

    fn row_index(&self, record_number: u32) -> Option<usize> {
        if record_number == 0 || record_number as usize > self.data.len() {
            return None;
        }
        Some(record_number as usize - 1)
    }

    fn check_row(&self, values: &[FieldData]) -> Result<()> {
        if !self.writable {
            return Err(ShapefileError::Attribute(format!(
                "The DBase file \"{}\" was opened in read-only mode.",
                self.path.display()
            )));
        }
        if values.len() != self.fields.len() {
            return Err(ShapefileError::Attribute(format!(
                "Expected {} values but found {}.",
                self.fields.len(),
                values.len()
            )));
        }
        Ok(())
    }

    fn write(&self) -> Result<()> {
        let f = File::create(&self.path)?;
        let mut writer = ByteOrderWriter::new(BufWriter::new(f), Endianness::LittleEndian);

        writer.write_u8(3u8)?;

        let now = Local::now();
        writer.write_u8((now.year() - 1900) as u8)?;
        writer.write_u8(now.month() as u8)?;
        writer.write_u8(now.day() as u8)?;

        writer.write_u32(self.data.len() as u32)?; // number of records
        let header_size = 32u16 + self.fields.len() as u16 * 32u16 + 1u16;
        writer.write_u16(header_size)?;

        let mut bytes_in_record = 0u16;
        for field in &self.fields {
            bytes_in_record += field.field_length as u16;
        }
        bytes_in_record += 1;
        writer.write_u16(bytes_in_record)?;

        // reserved or unused bytes
        writer.write_bytes(&[0u8; 20])?;

        // Field descriptor array
        for field in &self.fields {
            let mut name = [0u8; 11];
            let bytes = field.name.as_bytes();
            let n = bytes.len().min(10);
            name[..n].copy_from_slice(&bytes[..n]);
            writer.write_bytes(&name)?;
            writer.write_u8(field.field_type as u8)?;
            writer.write_bytes(&[0u8; 4])?;
            writer.write_u8(field.field_length)?;
            writer.write_u8(field.decimal_count)?;
            writer.write_bytes(&[0u8; 14])?;
        }

        writer.write_u8(0x0D)?; // terminator byte

        for (rec, deleted) in self.data.iter().zip(self.deleted.iter()) {
            writer.write_u8(if *deleted { 0x2A } else { 0x20 })?;
            for (value, field) in rec.iter().zip(self.fields.iter()) {
                writer.write_bytes(&format_value(field, value))?;
            }
        }

        writer.write_u8(0x1A)?; // file terminator byte
        writer.flush()?;
        Ok(())
    }
}

impl AttributeStore for DbaseFile {
    fn num_records(&self) -> usize {
        self.data.len()
    }

    fn get_record_with_names(&self, record_number: u32) -> Option<AttributeRow> {
        let i = self.row_index(record_number)?;
        let mut row: AttributeRow = self
            .fields
            .iter()
            .zip(self.data[i].iter())
            .map(|(field, value)| (field.name.clone(), value.clone()))
            .collect();
        row.insert(
            DELETED_FIELD.to_string(),
            FieldData::Int(self.deleted[i] as i32),
        );
        Some(row)
    }

    fn replace_record(&mut self, values: Vec<FieldData>, record_number: u32) -> Result<()> {
        self.check_row(&values)?;
        let i = self.row_index(record_number).ok_or_else(|| {
            ShapefileError::Attribute(format!("Record {} does not exist.", record_number))
        })?;
        self.data[i] = values;
        self.deleted[i] = false;
        Ok(())
    }

    fn add_record(&mut self, values: Vec<FieldData>) -> Result<()> {
        self.check_row(&values)?;
        self.data.push(values);
        self.deleted.push(false);
        self.header.num_records = self.data.len() as u32;
        Ok(())
    }
}

fn dbase_truncated(_: std::io::Error) -> ShapefileError {
    ShapefileError::DbaseFormat("unexpected end of file".to_string())
}

fn read_table_header(
    bor: &mut ByteOrderReader<Cursor<Vec<u8>>>,
) -> Result<(AttributeHeader, Vec<AttributeField>)> {
    if bor.len() < 32 {
        return Err(ShapefileError::DbaseFormat(
            "file is too short for a table header".to_string(),
        ));
    }
    let mut header = AttributeHeader::default();
    header.version = bor.read_u8()?;
    header.year = 1900u32 + bor.read_u8()? as u32;
    header.month = bor.read_u8()?;
    header.day = bor.read_u8()?;
    header.num_records = bor.read_u32()?;
    header.bytes_in_header = bor.read_u16()?;
    header.bytes_in_record = bor.read_u16()?;
    bor.seek(32)?;

    // Field descriptors are 32-byte chunks ending at a 0x0D terminator.
    let mut fields = vec![];
    loop {
        let marker = bor.peek_u8().map_err(|_| {
            ShapefileError::DbaseFormat("missing field descriptor terminator".to_string())
        })?;
        if marker == 0x0d {
            break;
        }
        if bor.remaining() < 32 {
            return Err(ShapefileError::DbaseFormat(
                "truncated field descriptor".to_string(),
            ));
        }
        let raw_name = bor.read_utf8(11)?;
        let name = raw_name.split(char::from(0)).next().unwrap_or("").to_string();
        let field_type = char::from(bor.read_u8()?);
        bor.inc_pos(4)?;
        let field_length = bor.read_u8()?;
        let decimal_count = bor.read_u8()?;
        bor.inc_pos(14)?;
        fields.push(AttributeField::new(&name, field_type, field_length, decimal_count));
    }
    header.num_fields = fields.len() as u32;
    Ok((header, fields))
}

fn parse_value(field: &AttributeField, str_rep: &str) -> FieldData {
    if str_rep.replace(" ", "").replace("?", "").is_empty() {
        return FieldData::Null;
    }
    match field.field_type {
        'N' | 'F' | 'I' | 'O' => {
            if field.decimal_count == 0 {
                if let Ok(v) = str_rep.parse::<i32>() {
                    return FieldData::Int(v);
                }
                if let Ok(v) = str_rep.parse::<i64>() {
                    return FieldData::Int64(v);
                }
            }
            match str_rep.parse::<f64>() {
                Ok(v) => FieldData::Real(v),
                Err(_) => FieldData::Text(str_rep.to_string()),
            }
        }
        'D' => {
            if str_rep.len() == 8 && str_rep.is_char_boundary(4) && str_rep.is_char_boundary(6) {
                FieldData::Date(DateData {
                    year: str_rep[0..4].parse::<u16>().unwrap_or(0),
                    month: str_rep[4..6].parse::<u8>().unwrap_or(0),
                    day: str_rep[6..8].parse::<u8>().unwrap_or(0),
                })
            } else {
                FieldData::Null
            }
        }
        'L' => {
            let lower = str_rep.to_lowercase();
            FieldData::Bool(lower.starts_with('t') || lower.starts_with('y'))
        }
        _ => FieldData::Text(str_rep.to_string()),
    }
}

/// Fixed-width cell bytes: numbers right-aligned, text left-aligned.
fn format_value(field: &AttributeField, value: &FieldData) -> Vec<u8> {
    let fl = field.field_length as usize;
    let right_aligned = |s: String| -> Vec<u8> {
        let b = s.into_bytes();
        if b.len() < fl {
            let mut out = vec![b' '; fl - b.len()];
            out.extend_from_slice(&b);
            out
        } else {
            b[b.len() - fl..].to_vec()
        }
    };
    let left_aligned = |s: &str| -> Vec<u8> {
        let mut b = s.as_bytes().to_vec();
        b.resize(fl, b' ');
        b
    };
    match value {
        FieldData::Null => vec![b' '; fl],
        FieldData::Int(v) => right_aligned(v.to_string()),
        FieldData::Int64(v) => right_aligned(v.to_string()),
        FieldData::Real(v) => {
            let dc = field.decimal_count as usize;
            let s = format!("{:.*}", dc, v);
            if s.len() > fl {
                let mut t = s;
                t.truncate(fl);
                left_aligned(&t)
            } else {
                right_aligned(s)
            }
        }
        FieldData::Bool(v) => left_aligned(if *v { "T" } else { "F" }),
        FieldData::Date(v) => left_aligned(&v.to_string()),
        FieldData::Text(v) => match field.field_type {
            'N' | 'F' => right_aligned(v.trim().to_string()),
            _ => left_aligned(v),
        },
    }
}
