/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT
*/
use super::attributes::{AttributeField, AttributeRow, FieldData};
use crate::error::{Result, ShapefileError};
use shapefile_common::structures::{BoundingBox, PointZM};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
    Unknown,
}

impl ShapeType {
    /// Returns `None` for codes outside the registry.
    pub fn from_int(value: i32) -> Option<ShapeType> {
        match value {
            -1 => Some(ShapeType::Unknown),
            0 => Some(ShapeType::Null),
            1 => Some(ShapeType::Point),
            3 => Some(ShapeType::PolyLine),
            5 => Some(ShapeType::Polygon),
            8 => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            31 => Some(ShapeType::MultiPatch),
            _ => None,
        }
    }

    pub fn to_int(&self) -> i32 {
        match self {
            ShapeType::Unknown => -1,
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    pub fn base_shape_type(&self) -> ShapeType {
        match self {
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => ShapeType::Point,
            ShapeType::PolyLine | ShapeType::PolyLineZ | ShapeType::PolyLineM => {
                ShapeType::PolyLine
            }
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM => ShapeType::Polygon,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                ShapeType::MultiPoint
            }
            other => *other,
        }
    }

    pub fn dimension(&self) -> ShapeTypeDimension {
        match self {
            ShapeType::PointM
            | ShapeType::PolyLineM
            | ShapeType::PolygonM
            | ShapeType::MultiPointM => ShapeTypeDimension::Measure,
            ShapeType::PointZ
            | ShapeType::PolyLineZ
            | ShapeType::PolygonZ
            | ShapeType::MultiPointZ => ShapeTypeDimension::Z,
            _ => ShapeTypeDimension::XY,
        }
    }

    /// Whether records of this type carry a z value per point.
    pub fn has_z(&self) -> bool {
        self.dimension() == ShapeTypeDimension::Z
    }

    /// Whether records of this type carry a measure per point. The Z types
    /// carry measures as well.
    pub fn has_m(&self) -> bool {
        self.dimension() != ShapeTypeDimension::XY
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeType::Unknown => "Unknown Shape",
            ShapeType::Null => "Null Shape",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
            ShapeType::MultiPatch => "MultiPatch",
        }
    }
}

/// Human-readable name for a raw shape-type code, e.g. `Shape 99` for a code
/// outside the registry.
pub fn shape_name(code: i32) -> String {
    match ShapeType::from_int(code) {
        Some(st) => st.name().to_string(),
        None => format!("Shape {}", code),
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeTypeDimension {
    XY,
    Measure,
    Z,
}

impl Default for ShapeType {
    fn default() -> ShapeType {
        ShapeType::Null
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The geometry payload of a record. Which variant a record holds follows
/// from its shape type.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Null,
    Point(PointZM),
    MultiPoint(Vec<PointZM>),
    /// Polyline and polygon records; each part is a line or a ring.
    Parts(Vec<Vec<PointZM>>),
}

impl Geometry {
    fn empty_for(shape_type: ShapeType) -> Geometry {
        match shape_type.base_shape_type() {
            ShapeType::Point => Geometry::Point(PointZM::default()),
            ShapeType::MultiPoint => Geometry::MultiPoint(vec![]),
            ShapeType::PolyLine | ShapeType::Polygon => Geometry::Parts(vec![]),
            _ => Geometry::Null,
        }
    }
}

/// A single Shapefile record: geometry, its bounding box and the attribute
/// row that shares its record number.
#[derive(Clone, Debug)]
pub struct ShapeRecord {
    /// 1-based position in the file. Reassigned when the record is added to
    /// a `Shapefile` and again when the file is saved.
    pub record_number: u32,
    pub attributes: AttributeRow,
    /// Message of the last failed operation on this record, empty otherwise.
    pub last_error: String,
    shape_type: ShapeType,
    geometry: Geometry,
    bounding_box: BoundingBox,
}

impl ShapeRecord {
    pub fn new(shape_type: ShapeType) -> ShapeRecord {
        ShapeRecord {
            record_number: 0,
            attributes: AttributeRow::new(),
            last_error: String::new(),
            shape_type: shape_type,
            geometry: Geometry::empty_for(shape_type),
            bounding_box: BoundingBox::new(),
        }
    }

    pub(crate) fn from_parts(
        shape_type: ShapeType,
        record_number: u32,
        geometry: Geometry,
        bounding_box: BoundingBox,
    ) -> ShapeRecord {
        ShapeRecord {
            record_number: record_number,
            attributes: AttributeRow::new(),
            last_error: String::new(),
            shape_type: shape_type,
            geometry: geometry,
            bounding_box: bounding_box,
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn get_shape_name(&self) -> &'static str {
        self.shape_type.name()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn num_parts(&self) -> usize {
        match &self.geometry {
            Geometry::Parts(parts) => parts.len(),
            _ => 0,
        }
    }

    pub fn num_points(&self) -> usize {
        match &self.geometry {
            Geometry::Null => 0,
            Geometry::Point(_) => 1,
            Geometry::MultiPoint(points) => points.len(),
            Geometry::Parts(parts) => parts.iter().map(|p| p.len()).sum(),
        }
    }

    /// All points of the record in file order.
    pub fn points(&self) -> Vec<PointZM> {
        match &self.geometry {
            Geometry::Null => vec![],
            Geometry::Point(p) => vec![*p],
            Geometry::MultiPoint(points) => points.clone(),
            Geometry::Parts(parts) => parts.iter().flatten().copied().collect(),
        }
    }

    /// The parts of a polyline or polygon record; empty for other types.
    pub fn parts(&self) -> &[Vec<PointZM>] {
        match &self.geometry {
            Geometry::Parts(parts) => parts,
            _ => &[],
        }
    }

    /// Adds a point to the record.
    ///
    /// Point records have their single point replaced. Multipoint records
    /// append to their point list. Polyline and polygon records append to
    /// part `part_index`, creating it (and any missing parts before it) if
    /// needed. Missing z or measure values default to zero when the shape
    /// type carries them. The record's bounding box grows to include the
    /// point.
    pub fn add_point(&mut self, point: PointZM, part_index: usize) -> Result<()> {
        self.last_error.clear();
        self.check_supported()?;
        let point = self.adjust_point(point);
        match &mut self.geometry {
            Geometry::Null => return Ok(()),
            Geometry::Point(p) => {
                *p = point;
                self.bounding_box = BoundingBox::new();
            }
            Geometry::MultiPoint(points) => {
                points.push(point);
            }
            Geometry::Parts(parts) => {
                if parts.len() <= part_index {
                    parts.resize(part_index + 1, vec![]);
                }
                parts[part_index].push(point);
            }
        }
        self.bounding_box.expand_to_point(&point);
        Ok(())
    }

    /// Removes a point from the record.
    ///
    /// Point records keep their point but have its coordinates zeroed.
    /// Multipoint, polyline and polygon records drop the point if it exists.
    /// The bounding box is never shrunk.
    pub fn delete_point(&mut self, point_index: usize, part_index: usize) -> Result<()> {
        self.last_error.clear();
        self.check_supported()?;
        let shape_type = self.shape_type;
        match &mut self.geometry {
            Geometry::Null => {}
            Geometry::Point(p) => {
                p.x = 0f64;
                p.y = 0f64;
                if shape_type.has_m() {
                    p.m = Some(0f64);
                }
                if shape_type.has_z() {
                    p.z = Some(0f64);
                }
            }
            Geometry::MultiPoint(points) => {
                if point_index < points.len() {
                    points.remove(point_index);
                }
            }
            Geometry::Parts(parts) => {
                if let Some(part) = parts.get_mut(part_index) {
                    if point_index < part.len() {
                        part.remove(point_index);
                    }
                }
            }
        }
        Ok(())
    }

    /// Re-keys the attribute row to exactly the given fields, keeping values
    /// of fields that still exist and defaulting new ones to an empty string.
    pub fn update_dbf_info(&mut self, fields: &[AttributeField]) {
        let mut old = std::mem::take(&mut self.attributes);
        for field in fields {
            let value = old
                .shift_remove(&field.name)
                .unwrap_or_else(|| FieldData::Text(String::new()));
            self.attributes.insert(field.name.clone(), value);
        }
    }

    fn adjust_point(&self, mut point: PointZM) -> PointZM {
        if self.shape_type.has_m() && point.m.is_none() {
            point.m = Some(0f64);
        }
        if self.shape_type.has_z() && point.z.is_none() {
            point.z = Some(0f64);
        }
        point
    }

    fn check_supported(&mut self) -> Result<()> {
        match self.shape_type {
            ShapeType::MultiPatch | ShapeType::Unknown => self.fail(
                ShapefileError::UnsupportedShapeType(self.shape_type.to_int()),
            ),
            _ => Ok(()),
        }
    }

    pub(crate) fn fail<T>(&mut self, err: ShapefileError) -> Result<T> {
        self.last_error = err.to_string();
        Err(err)
    }
}

impl fmt::Display for ShapeRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "record_number: {}", self.record_number)?;
        writeln!(f, "shape_type: {}", self.shape_type)?;
        writeln!(f, "bounding_box: {}", self.bounding_box)?;
        writeln!(f, "num_parts: {}", self.num_parts())?;
        write!(f, "num_points: {}", self.num_points())
    }
}
