/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT

NOTE: Reading and writing of individual .shp records. Every record starts
with an 8-byte big-endian header (record number, content length in 16-bit
words) followed by a little-endian body that begins with the shape type.
*/
use super::attributes::{AttributeStore, FieldData, DELETED_FIELD};
use super::geometry::{Geometry, ShapeRecord, ShapeType};
use crate::error::{Result, ShapefileError};
use log::warn;
use shapefile_common::structures::{Axis, BoundingBox, PointZM};
use shapefile_common::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::io;
use std::io::prelude::*;

const RECORD_HEADER_SIZE: usize = 8;

impl ShapeRecord {
    /// Decodes the record at the reader's position.
    ///
    /// Returns `Ok(None)` when the stream has no further record, including a
    /// trailing fragment too short to hold a record header. `has_measure`
    /// is the container's measure flag; it gates the measure block of
    /// multipoint, polyline and polygon records.
    pub fn read_from<R: Read + Seek>(
        bor: &mut ByteOrderReader<R>,
        has_measure: bool,
    ) -> Result<Option<ShapeRecord>> {
        let remaining = bor.remaining();
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < RECORD_HEADER_SIZE {
            warn!(
                "Ignoring {} trailing bytes at offset {}; too short for a record header.",
                remaining,
                bor.pos()
            );
            bor.inc_pos(remaining)?;
            return Ok(None);
        }

        bor.set_byte_order(Endianness::BigEndian);
        let record_number = bor.read_u32()?;
        let content_length = bor.read_u32()?;
        let size = content_length as usize * 2;

        bor.set_byte_order(Endianness::LittleEndian);
        let start = bor.pos();
        let context = format!("record {}", record_number);
        let code = bor
            .read_i32()
            .map_err(ShapefileError::truncated(&context))?;
        let shape_type =
            ShapeType::from_int(code).ok_or(ShapefileError::UnsupportedShapeType(code))?;

        let (geometry, bounding_box) = read_body(bor, shape_type, has_measure)
            .map_err(|e| match e {
                ShapefileError::Io(e) => ShapefileError::truncated(&context)(e),
                other => other,
            })?;

        // skip any padding the writer left after the body
        while bor.pos() - start < size && bor.remaining() >= 4 {
            bor.read_u32()?;
        }
        let read = bor.pos() - start;
        if read != size {
            return Err(ShapefileError::LengthMismatch {
                read: read,
                size: size,
            });
        }

        Ok(Some(ShapeRecord::from_parts(
            shape_type,
            record_number,
            geometry,
            bounding_box,
        )))
    }

    /// Writes the record header and body.
    pub fn write_to<W: Write>(&self, bow: &mut ByteOrderWriter<W>) -> Result<()> {
        let content_length = self.content_length()?;
        bow.set_byte_order(Endianness::BigEndian);
        bow.write_u32(self.record_number)?;
        bow.write_u32(content_length)?;
        self.write_body(bow)
    }

    /// Length of the encoded body in 16-bit words, shape type included.
    pub fn content_length(&self) -> Result<u32> {
        let mut counter = ByteOrderWriter::new(io::sink(), Endianness::LittleEndian);
        self.write_body(&mut counter)?;
        Ok((counter.get_num_bytes_written() / 2) as u32)
    }

    fn write_body<W: Write>(&self, bow: &mut ByteOrderWriter<W>) -> Result<()> {
        let shape_type = self.shape_type();
        if matches!(shape_type, ShapeType::MultiPatch | ShapeType::Unknown) {
            return Err(ShapefileError::UnsupportedShapeType(shape_type.to_int()));
        }
        bow.set_byte_order(Endianness::LittleEndian);
        bow.write_i32(shape_type.to_int())?;

        let bb = self.bounding_box();
        match self.geometry() {
            Geometry::Null => {}
            Geometry::Point(p) => {
                bow.write_f64(p.x)?;
                bow.write_f64(p.y)?;
                if shape_type.has_z() {
                    bow.write_f64(p.z.unwrap_or(0f64))?;
                }
                if shape_type.has_m() {
                    bow.write_f64(p.m.unwrap_or(0f64))?;
                }
            }
            Geometry::MultiPoint(points) => {
                write_extent(bow, bb)?;
                bow.write_u32(points.len() as u32)?;
                write_points(bow, shape_type, bb, points.iter())?;
            }
            Geometry::Parts(parts) => {
                write_extent(bow, bb)?;
                bow.write_u32(parts.len() as u32)?;
                let num_points: usize = parts.iter().map(|p| p.len()).sum();
                bow.write_u32(num_points as u32)?;
                let mut start = 0u32;
                for part in parts {
                    bow.write_u32(start)?;
                    start += part.len() as u32;
                }
                write_points(bow, shape_type, bb, parts.iter().flatten())?;
            }
        }
        Ok(())
    }

    /// Attaches the attribute row that shares this record's number. A missing
    /// row leaves the record with empty attributes.
    pub fn load_attributes(&mut self, store: &dyn AttributeStore) {
        match store.get_record_with_names(self.record_number) {
            Some(mut row) => {
                row.shift_remove(DELETED_FIELD);
                self.attributes = row;
            }
            None => {
                warn!(
                    "No attribute row found for record {}.",
                    self.record_number
                );
                self.attributes.clear();
            }
        }
    }

    /// Writes this record's attributes to the store, replacing the row with
    /// the same record number or appending a new one. Records without
    /// attributes are skipped. Failure is recorded in `last_error`.
    pub fn save_attributes(&mut self, store: &mut dyn AttributeStore) -> Result<()> {
        self.last_error.clear();
        if self.attributes.is_empty() {
            return Ok(());
        }
        self.attributes.shift_remove(DELETED_FIELD);
        let values: Vec<FieldData> = self.attributes.values().cloned().collect();
        let (result, message) = if self.record_number as usize <= store.num_records() {
            (
                store.replace_record(values, self.record_number),
                "I wasn't possible to update the information in the DBF file.",
            )
        } else {
            (
                store.add_record(values),
                "I wasn't possible to add the information to the DBF file.",
            )
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) => self.fail(ShapefileError::Attribute(format!("{} {}", message, e))),
        }
    }
}

fn read_body<R: Read + Seek>(
    bor: &mut ByteOrderReader<R>,
    shape_type: ShapeType,
    has_measure: bool,
) -> Result<(Geometry, BoundingBox)> {
    let mut bb = BoundingBox::new();
    let geometry = match shape_type.base_shape_type() {
        ShapeType::Null => Geometry::Null,
        ShapeType::Point => {
            let mut p = PointZM::new(bor.read_f64()?, bor.read_f64()?);
            if shape_type.has_z() {
                p.z = Some(bor.read_f64()?);
            }
            if shape_type.has_m() {
                p.m = Some(bor.read_f64()?);
            }
            bb.expand_to_point(&p);
            Geometry::Point(p)
        }
        ShapeType::MultiPoint => {
            read_extent(bor, &mut bb)?;
            let num_points = read_count(bor, 16)?;
            let mut points = read_xy(bor, num_points)?;
            read_z_and_m(bor, shape_type, has_measure, &mut bb, &mut points)?;
            Geometry::MultiPoint(points)
        }
        ShapeType::PolyLine | ShapeType::Polygon => {
            read_extent(bor, &mut bb)?;
            let num_parts = read_count(bor, 4)?;
            let num_points = read_count(bor, 16)?;
            let mut part_starts = Vec::with_capacity(num_parts);
            for _ in 0..num_parts {
                part_starts.push(bor.read_u32()? as usize);
            }
            let mut points = read_xy(bor, num_points)?;
            read_z_and_m(bor, shape_type, has_measure, &mut bb, &mut points)?;
            Geometry::Parts(split_parts(points, &part_starts))
        }
        _ => return Err(ShapefileError::UnsupportedShapeType(shape_type.to_int())),
    };
    Ok((geometry, bb))
}

/// Reads a count, refusing values that could not fit in what is left of the
/// stream at `min_item_size` bytes per item.
fn read_count<R: Read + Seek>(bor: &mut ByteOrderReader<R>, min_item_size: usize) -> Result<usize> {
    let n = bor.read_u32()? as usize;
    if n.saturating_mul(min_item_size) > bor.remaining() {
        return Err(ShapefileError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("count {} exceeds the remaining data", n),
        )));
    }
    Ok(n)
}

fn read_extent<R: Read + Seek>(bor: &mut ByteOrderReader<R>, bb: &mut BoundingBox) -> Result<()> {
    bb.x_min = Some(bor.read_f64()?);
    bb.y_min = Some(bor.read_f64()?);
    bb.x_max = Some(bor.read_f64()?);
    bb.y_max = Some(bor.read_f64()?);
    Ok(())
}

fn read_xy<R: Read + Seek>(bor: &mut ByteOrderReader<R>, n: usize) -> Result<Vec<PointZM>> {
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        points.push(PointZM::new(bor.read_f64()?, bor.read_f64()?));
    }
    Ok(points)
}

fn read_z_and_m<R: Read + Seek>(
    bor: &mut ByteOrderReader<R>,
    shape_type: ShapeType,
    has_measure: bool,
    bb: &mut BoundingBox,
    points: &mut [PointZM],
) -> Result<()> {
    if shape_type.has_z() {
        bb.z_min = Some(bor.read_f64()?);
        bb.z_max = Some(bor.read_f64()?);
        for p in points.iter_mut() {
            p.z = Some(bor.read_f64()?);
        }
    }
    if shape_type.has_m() && has_measure {
        bb.m_min = Some(bor.read_f64()?);
        bb.m_max = Some(bor.read_f64()?);
        for p in points.iter_mut() {
            p.m = Some(bor.read_f64()?);
        }
    }
    Ok(())
}

/// Splits the flat point list at the part start indices. A start that equals
/// the next part's start yields an empty part. Points without any part table
/// form an implicit part 0.
fn split_parts(points: Vec<PointZM>, part_starts: &[usize]) -> Vec<Vec<PointZM>> {
    if part_starts.is_empty() {
        if points.is_empty() {
            return vec![];
        }
        return vec![points];
    }
    let mut parts: Vec<Vec<PointZM>> = vec![vec![]; part_starts.len()];
    let mut part = 0usize;
    for (i, p) in points.into_iter().enumerate() {
        while part + 1 < part_starts.len() && i >= part_starts[part + 1] {
            part += 1;
        }
        parts[part].push(p);
    }
    parts
}

fn write_extent<W: Write>(bow: &mut ByteOrderWriter<W>, bb: &BoundingBox) -> Result<()> {
    let v = bb.to_array();
    for value in &v[0..4] {
        bow.write_f64(*value)?;
    }
    Ok(())
}

fn write_points<'a, W: Write, I>(
    bow: &mut ByteOrderWriter<W>,
    shape_type: ShapeType,
    bb: &BoundingBox,
    points: I,
) -> Result<()>
where
    I: Iterator<Item = &'a PointZM> + Clone,
{
    for p in points.clone() {
        bow.write_f64(p.x)?;
        bow.write_f64(p.y)?;
    }
    if shape_type.has_z() {
        write_range(bow, bb, Axis::Z)?;
        for p in points.clone() {
            bow.write_f64(p.z.unwrap_or(0f64))?;
        }
    }
    if shape_type.has_m() {
        write_range(bow, bb, Axis::M)?;
        for p in points {
            bow.write_f64(p.m.unwrap_or(0f64))?;
        }
    }
    Ok(())
}

fn write_range<W: Write>(bow: &mut ByteOrderWriter<W>, bb: &BoundingBox, axis: Axis) -> Result<()> {
    let (min, max) = bb.get(axis);
    bow.write_f64(min.unwrap_or(0f64))?;
    bow.write_f64(max.unwrap_or(0f64))?;
    Ok(())
}
