/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT
*/

use crate::error::{Result, ShapefileError};
use shapefile_common::structures::BoundingBox;
use shapefile_common::utils::{read_double, read_int, ByteOrderWriter, Endianness};
use std::fmt;
use std::fs;
use std::io::prelude::*;
use std::path::Path;

pub const FILE_CODE: i32 = 9994;
pub const VERSION: i32 = 1000;
pub const HEADER_SIZE: usize = 100;

/// Size in 16-bit words of the header shared by .shp and .shx files.
pub const HEADER_WORDS: u32 = (HEADER_SIZE / 2) as u32;

/// The 100-byte header shared by .shp and .shx files.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct ShapefileHeader {
    pub file_code: i32,
    pub file_length: u32, // in 16-bit words, header included
    pub version: i32,
    pub shape_type: i32,
    pub bounding_box: BoundingBox,
}

impl ShapefileHeader {
    pub fn new(file_length: u32, shape_type: i32, bounding_box: BoundingBox) -> ShapefileHeader {
        ShapefileHeader {
            file_code: FILE_CODE,
            file_length: file_length,
            version: VERSION,
            shape_type: shape_type,
            bounding_box: bounding_box,
        }
    }

    /// Parses a header from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<ShapefileHeader> {
        if bytes.len() < 4 || read_int(&bytes[0..4], Endianness::BigEndian)? != FILE_CODE {
            return Err(ShapefileError::NotShapefile);
        }
        if bytes.len() < HEADER_SIZE {
            return Err(ShapefileError::Truncated("file header".to_string()));
        }
        let mut extent = [0f64; 8];
        for (i, value) in extent.iter_mut().enumerate() {
            let offset = 36 + i * 8;
            *value = read_double(&bytes[offset..offset + 8])?;
        }
        Ok(ShapefileHeader {
            file_code: FILE_CODE,
            file_length: read_int(&bytes[24..28], Endianness::BigEndian)? as u32,
            version: read_int(&bytes[28..32], Endianness::LittleEndian)?,
            shape_type: read_int(&bytes[32..36], Endianness::LittleEndian)?,
            bounding_box: BoundingBox::from_array(extent),
        })
    }

    pub fn write_to<W: Write>(&self, bow: &mut ByteOrderWriter<W>) -> Result<()> {
        bow.set_byte_order(Endianness::BigEndian);
        bow.write_i32(self.file_code)?;
        // unused header bytes
        for _ in 0..5 {
            bow.write_i32(0i32)?;
        }
        bow.write_u32(self.file_length)?;
        bow.set_byte_order(Endianness::LittleEndian);
        bow.write_i32(self.version)?;
        bow.write_i32(self.shape_type)?;
        for value in self.bounding_box.to_array().iter() {
            bow.write_f64(*value)?;
        }
        Ok(())
    }
}

impl fmt::Display for ShapefileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let v = self.bounding_box.to_array();
        let s = format!(
            "file_code: {}
file_length: {}
version: {}
shape_type: {}
x_min: {}
x_max: {}
y_min: {}
y_max: {}
z_min: {}
z_max: {}
m_min: {}
m_max: {}",
            self.file_code,
            self.file_length,
            self.version,
            super::geometry::shape_name(self.shape_type),
            v[0],
            v[2],
            v[1],
            v[3],
            v[4],
            v[5],
            v[6],
            v[7]
        );
        write!(f, "{}", s)
    }
}

/// One .shx entry: where a record starts in the .shp file and how long its
/// body is, both in 16-bit words.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct IndexEntry {
    pub offset: u32,
    pub content_length: u32,
}

impl IndexEntry {
    pub fn write_to<W: Write>(&self, bow: &mut ByteOrderWriter<W>) -> Result<()> {
        bow.set_byte_order(Endianness::BigEndian);
        bow.write_u32(self.offset)?;
        bow.write_u32(self.content_length)?;
        Ok(())
    }
}

/// Reads a .shx index file.
pub fn read_index_file<P: AsRef<Path>>(path: P) -> Result<(ShapefileHeader, Vec<IndexEntry>)> {
    let bytes = fs::read(path.as_ref()).map_err(|e| ShapefileError::OpenFile {
        role: "Index",
        path: path.as_ref().display().to_string(),
        source: e,
    })?;
    let header = ShapefileHeader::from_bytes(&bytes)?;
    let entries = bytes[HEADER_SIZE..]
        .chunks_exact(8)
        .map(|chunk| {
            Ok(IndexEntry {
                offset: read_int(&chunk[0..4], Endianness::BigEndian)? as u32,
                content_length: read_int(&chunk[4..8], Endianness::BigEndian)? as u32,
            })
        })
        .collect::<Result<Vec<IndexEntry>>>()?;
    Ok((header, entries))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_header_layout() {
        let bb = BoundingBox::from_array([1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]);
        let header = ShapefileHeader::new(50, 1, bb);
        let mut bow = ByteOrderWriter::new(Vec::new(), Endianness::BigEndian);
        header.write_to(&mut bow).unwrap();
        let bytes = bow.into_inner();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], &[0x00, 0x00, 0x27, 0x0a]);
        assert_eq!(&bytes[24..28], &[0, 0, 0, 50]);
        assert_eq!(&bytes[28..32], &[0xe8, 0x03, 0, 0]);
        assert_eq!(&bytes[32..36], &[1, 0, 0, 0]);
        assert_eq!(ShapefileHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_bad_headers() {
        assert!(matches!(
            ShapefileHeader::from_bytes(&[]),
            Err(ShapefileError::NotShapefile)
        ));
        assert!(matches!(
            ShapefileHeader::from_bytes(&[0, 0, 0x27, 0x0b, 0, 0]),
            Err(ShapefileError::NotShapefile)
        ));
        assert!(matches!(
            ShapefileHeader::from_bytes(&[0, 0, 0x27, 0x0a, 0, 0]),
            Err(ShapefileError::Truncated(_))
        ));
    }

    #[test]
    fn test_display_names_shape_type() {
        let header = ShapefileHeader::new(50, 25, BoundingBox::new());
        let s = header.to_string();
        assert!(s.contains("shape_type: PolygonM"));
        assert!(s.starts_with("file_code: 9994"));
    }

    #[test]
    fn test_read_index_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.shx");
        let mut bow = ByteOrderWriter::new(Vec::new(), Endianness::BigEndian);
        ShapefileHeader::new(HEADER_WORDS + 8, 1, BoundingBox::new())
            .write_to(&mut bow)
            .unwrap();
        let entries = vec![
            IndexEntry {
                offset: 50,
                content_length: 10,
            },
            IndexEntry {
                offset: 64,
                content_length: 10,
            },
        ];
        for e in &entries {
            e.write_to(&mut bow).unwrap();
        }
        fs::write(&path, bow.into_inner()).unwrap();
        let (header, read) = read_index_file(&path).unwrap();
        assert_eq!(header.file_length, 58);
        assert_eq!(read, entries);

        let missing = read_index_file(dir.path().join("nope.shx")).unwrap_err();
        assert!(missing.to_string().starts_with("It wasn't possible to open the Index file"));
    }
}
