/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT

Notes: The logic behind working with the ESRI Shapefile format. A Shapefile
is a geometry file (.shp), an offset index (.shx) and an attribute table
(.dbf), optionally accompanied by a projection (.prj).
*/

pub mod attributes;
pub mod geometry;
pub mod header;
mod record;

use self::attributes::*;
use self::geometry::*;
use self::header::{IndexEntry, ShapefileHeader, HEADER_SIZE, HEADER_WORDS};
use crate::error::{Result, ShapefileError};
use log::{debug, warn};
use shapefile_common::configs::Configs;
use shapefile_common::structures::{Axis, BoundingBox};
use shapefile_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};

/// `Shapefile` is an in-memory ESRI Shapefile.
///
/// Examples:
///
/// ```no_run
/// use shapefile_vector::{AttributeField, FieldData, PointZM, ShapeRecord, ShapeType, Shapefile};
///
/// // Read a Shapefile from a file.
/// let input = Shapefile::read("data/roads.shp")?;
/// println!("{} records", input.num_records());
///
/// // Create a new output Shapefile with one attribute field.
/// let mut output = Shapefile::new(ShapeType::Point, None, Some("data/sites.*"));
/// output.set_dbf_header(vec![AttributeField::new("NAME", 'C', 20, 0)]);
/// let mut site = ShapeRecord::new(ShapeType::Point);
/// site.add_point(PointZM::new(482131.764567, 2143634.39608), 0)?;
/// site.attributes.insert("NAME".to_string(), FieldData::Text("Well 7".to_string()));
/// output.add_record(site)?;
/// output.save(None)?;
/// # Ok::<(), shapefile_vector::ShapefileError>(())
/// ```
pub struct Shapefile {
    /// Base path of the file set. Any extension (`roads.shp`, `roads.*`) is
    /// replaced when resolving the companion files.
    pub file_name: String,
    pub shape_type: ShapeType,
    pub bounding_box: BoundingBox,
    pub projection: String,
    pub configs: Configs,
    /// Message of the last failed operation, empty otherwise.
    pub last_error: String,
    records: Vec<ShapeRecord>,
    dbf_header: Option<Vec<AttributeField>>,
    file_length: u32,
    buffer: Option<Vec<u8>>,
}

impl Shapefile {
    pub fn new(
        shape_type: ShapeType,
        bounding_box: Option<BoundingBox>,
        file_name: Option<&str>,
    ) -> Shapefile {
        Shapefile {
            file_name: file_name.unwrap_or("").to_string(),
            shape_type: shape_type,
            bounding_box: bounding_box.unwrap_or_default(),
            projection: String::new(),
            configs: Configs::default(),
            last_error: String::new(),
            records: vec![],
            dbf_header: None,
            file_length: HEADER_WORDS,
            buffer: None,
        }
    }

    pub fn with_configs(shape_type: ShapeType, configs: Configs) -> Shapefile {
        let mut sf = Shapefile::new(shape_type, None, None);
        sf.configs = configs;
        sf
    }

    /// Loads the Shapefile named `file_name`.
    pub fn read(file_name: &str) -> Result<Shapefile> {
        let mut sf = Shapefile::new(ShapeType::Null, None, None);
        sf.load(file_name)?;
        Ok(sf)
    }

    /// Decodes a Shapefile from the bytes of a .shp file. No attribute table
    /// is read.
    pub fn read_from_bytes(bytes: Vec<u8>) -> Result<Shapefile> {
        let mut sf = Shapefile::new(ShapeType::Null, None, None);
        sf.set_buffer(bytes);
        sf.load("")?;
        Ok(sf)
    }

    /// Supplies the geometry bytes used by `load("")`.
    pub fn set_buffer(&mut self, bytes: Vec<u8>) {
        self.buffer = Some(bytes);
    }

    pub fn set_allow_no_dbf(&mut self, allow: bool) {
        self.configs.allow_no_dbf = allow;
    }

    /// Whether attribute tables are read and written by this build.
    pub fn supports_dbase() -> bool {
        cfg!(feature = "dbase")
    }

    /// Replaces the contents of this container with the Shapefile named
    /// `file_name`. An empty name decodes the buffer given to `set_buffer`.
    pub fn load(&mut self, file_name: &str) -> Result<()> {
        self.last_error.clear();
        let result = self.load_file(file_name);
        self.record_error(result)
    }

    /// Writes the .shp, .shx and (when a schema is set) .dbf files. The name
    /// given here, if any, replaces `file_name`.
    pub fn save(&mut self, file_name: Option<&str>) -> Result<()> {
        self.last_error.clear();
        if let Some(name) = file_name {
            self.file_name = name.to_string();
        }
        let result = self.save_file();
        self.record_error(result)
    }

    /// Appends a record and returns its 0-based index. The record is re-keyed
    /// to the current attribute schema and renumbered to its new position;
    /// the container's bounding box widens to cover it.
    pub fn add_record(&mut self, mut record: ShapeRecord) -> Result<usize> {
        self.last_error.clear();
        if let Some(fields) = &self.dbf_header {
            record.update_dbf_info(fields);
        }
        let content_length = match record.content_length() {
            Ok(cl) => cl,
            Err(e) => return self.record_error(Err(e)),
        };
        self.file_length += content_length + 4;
        record.record_number = self.records.len() as u32 + 1;

        let bb = *record.bounding_box();
        self.bounding_box.expand_axis_to(Axis::X, &bb);
        self.bounding_box.expand_axis_to(Axis::Y, &bb);
        if self.shape_type.has_m() {
            self.bounding_box.expand_axis_to(Axis::M, &bb);
        }
        if self.shape_type.has_z() {
            self.bounding_box.expand_axis_to(Axis::Z, &bb);
        }

        self.records.push(record);
        Ok(self.records.len() - 1)
    }

    /// Removes the record at `index`. Later records shift down without being
    /// renumbered; `save` assigns fresh record numbers.
    pub fn delete_record(&mut self, index: usize) {
        if index >= self.records.len() {
            return;
        }
        let record = self.records.remove(index);
        if let Ok(cl) = record.content_length() {
            self.file_length = self.file_length.saturating_sub(cl + 4);
        }
        debug!(
            "Deleted record {} ({} remaining)",
            record.record_number,
            self.records.len()
        );
    }

    pub fn get_dbf_header(&self) -> Option<&[AttributeField]> {
        self.dbf_header.as_deref()
    }

    /// Replaces the attribute schema and re-keys every record to it.
    pub fn set_dbf_header(&mut self, fields: Vec<AttributeField>) {
        for record in self.records.iter_mut() {
            record.update_dbf_info(&fields);
        }
        self.dbf_header = Some(fields);
    }

    /// Position of the first record whose `field` attribute matches `value`,
    /// ignoring case and surrounding whitespace. `None` when nothing matches.
    pub fn get_index_from_dbf_data(&self, field: &str, value: &str) -> Option<usize> {
        let wanted = value.to_uppercase();
        self.records.iter().position(|record| {
            record
                .attributes
                .get(field)
                .map_or(false, |v| v.to_string().trim().to_uppercase() == wanted)
        })
    }

    pub fn has_measure(&self) -> bool {
        self.bounding_box.has_measure()
    }

    pub fn get_shape_name(&self) -> &'static str {
        self.shape_type.name()
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    /// Returns the record at a specified index, starting at zero.
    pub fn get_record(&self, index: usize) -> Option<&ShapeRecord> {
        self.records.get(index)
    }

    /// Mutable access to a record. Changes to its geometry are not reflected
    /// in the container's bounding box or file length.
    pub fn get_record_mut(&mut self, index: usize) -> Option<&mut ShapeRecord> {
        self.records.get_mut(index)
    }

    pub fn get_total_num_parts(&self) -> usize {
        self.records.iter().map(|r| r.num_parts()).sum()
    }

    pub fn get_total_num_points(&self) -> usize {
        self.records.iter().map(|r| r.num_points()).sum()
    }

    /// Returns the filename, in shortened form (e.g. `roads` for `data/roads.shp`).
    pub fn get_short_filename(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Running file length in 16-bit words, header included.
    pub fn file_length(&self) -> u32 {
        self.file_length
    }

    fn path_with_extension(&self, extension: &str) -> PathBuf {
        Path::new(&self.file_name).with_extension(extension)
    }

    fn record_error<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.last_error = e.to_string();
        }
        result
    }

    fn load_file(&mut self, file_name: &str) -> Result<()> {
        let from_buffer = file_name.is_empty();
        let bytes = if from_buffer {
            self.buffer.clone().ok_or(ShapefileError::NotShapefile)?
        } else {
            self.file_name = file_name.to_string();
            let shp_file = self.path_with_extension("shp");
            fs::read(&shp_file).map_err(|e| ShapefileError::OpenFile {
                role: "Shape",
                path: shp_file.display().to_string(),
                source: e,
            })?
        };
        let dbf = if from_buffer { None } else { self.open_dbf()? };

        let header = ShapefileHeader::from_bytes(&bytes)?;
        self.shape_type = ShapeType::from_int(header.shape_type)
            .ok_or(ShapefileError::UnsupportedShapeType(header.shape_type))?;
        self.bounding_box = header.bounding_box;
        self.file_length = header.file_length;
        self.dbf_header = dbf.as_ref().map(|d| d.fields().to_vec());
        self.records.clear();
        debug!("Read header of {}\n{}", self.file_name, header);

        let has_measure = self.has_measure();
        let mut bor = ByteOrderReader::new(Cursor::new(bytes), Endianness::BigEndian)?;
        bor.seek(HEADER_SIZE)?;
        while let Some(mut record) = ShapeRecord::read_from(&mut bor, has_measure)? {
            if let Some(dbf) = &dbf {
                record.load_attributes(dbf);
            }
            self.records.push(record);
        }
        debug!("Read {} records", self.records.len());

        self.projection.clear();
        if !from_buffer && self.configs.read_projection {
            let prj_file = self.path_with_extension("prj");
            match fs::read_to_string(&prj_file) {
                Ok(text) => self.projection = text,
                Err(_) => warn!("Projection file not located: {}", prj_file.display()),
            }
        }
        Ok(())
    }

    fn open_dbf(&self) -> Result<Option<DbaseFile>> {
        if !Shapefile::supports_dbase() {
            return Ok(None);
        }
        let dbf_file = self.path_with_extension("dbf");
        if !dbf_file.exists() {
            if self.configs.allow_no_dbf {
                debug!("No attribute table at {}", dbf_file.display());
                return Ok(None);
            }
            return Err(ShapefileError::DbaseNotFound(dbf_file.display().to_string()));
        }
        match DbaseFile::open(&dbf_file) {
            Ok(dbf) => Ok(Some(dbf)),
            Err(e) => {
                warn!("{}", e);
                Err(ShapefileError::DbaseOpen(dbf_file.display().to_string()))
            }
        }
    }

    fn create_dbf(&self) -> Result<Option<DbaseFile>> {
        let fields = match &self.dbf_header {
            Some(fields) if !fields.is_empty() && Shapefile::supports_dbase() => fields,
            _ => return Ok(None),
        };
        let dbf_file = self.path_with_extension("dbf");
        if dbf_file.exists() {
            fs::remove_file(&dbf_file).map_err(|e| ShapefileError::DbaseCreate {
                path: dbf_file.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(Some(DbaseFile::create(&dbf_file, fields)?))
    }

    fn save_file(&mut self) -> Result<()> {
        let open_for_write = |role: &'static str, path: PathBuf| -> Result<ByteOrderWriter<BufWriter<File>>> {
            let f = File::create(&path).map_err(|e| ShapefileError::OpenFile {
                role: role,
                path: path.display().to_string(),
                source: e,
            })?;
            Ok(ByteOrderWriter::new(BufWriter::new(f), Endianness::BigEndian))
        };
        let mut shp = open_for_write("Shape", self.path_with_extension("shp"))?;
        let mut shx = open_for_write("Index", self.path_with_extension("shx"))?;
        let mut dbf = self.create_dbf()?;

        let mut content_lengths = Vec::with_capacity(self.records.len());
        for record in &self.records {
            content_lengths.push(record.content_length()?);
        }
        self.file_length = HEADER_WORDS + content_lengths.iter().map(|cl| cl + 4).sum::<u32>();

        let shape_type = self.shape_type.to_int();
        ShapefileHeader::new(self.file_length, shape_type, self.bounding_box).write_to(&mut shp)?;
        let index_length = HEADER_WORDS + 4 * self.records.len() as u32;
        ShapefileHeader::new(index_length, shape_type, self.bounding_box).write_to(&mut shx)?;

        let mut offset = HEADER_WORDS;
        for (i, record) in self.records.iter_mut().enumerate() {
            record.record_number = i as u32 + 1;
            record.write_to(&mut shp)?;
            IndexEntry {
                offset: offset,
                content_length: content_lengths[i],
            }
            .write_to(&mut shx)?;
            offset += 4 + content_lengths[i];

            if let Some(dbf) = dbf.as_mut() {
                if let Err(e) = record.save_attributes(dbf) {
                    warn!("Record {}: {}", record.record_number, e);
                }
            }
        }
        shp.flush()?;
        shx.flush()?;
        if let Some(dbf) = dbf.take() {
            dbf.close()?;
        }
        debug!(
            "Wrote {} records to {} ({} words)",
            self.records.len(),
            self.file_name,
            self.file_length
        );

        if !self.projection.is_empty() {
            let prj_file = self.path_with_extension("prj");
            fs::write(&prj_file, self.projection.as_bytes()).map_err(|e| {
                ShapefileError::OpenFile {
                    role: "Projection",
                    path: prj_file.display().to_string(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }
}

impl Default for Shapefile {
    fn default() -> Shapefile {
        Shapefile::new(ShapeType::Null, None, None)
    }
}
