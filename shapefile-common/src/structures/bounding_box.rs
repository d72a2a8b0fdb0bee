/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT
*/
use super::{Axis, PointZM};
use std::fmt;

/// An eight-value extent (x, y, z and m ranges). Each bound stays `None`
/// until a value for that axis arrives.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x_min: Option<f64>,
    pub y_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_max: Option<f64>,
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
    pub m_min: Option<f64>,
    pub m_max: Option<f64>,
}

impl BoundingBox {
    pub fn new() -> BoundingBox {
        BoundingBox::default()
    }

    /// Creates a box with only the planar extent populated.
    pub fn from_extent(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> BoundingBox {
        BoundingBox {
            x_min: Some(x_min),
            y_min: Some(y_min),
            x_max: Some(x_max),
            y_max: Some(y_max),
            ..Default::default()
        }
    }

    /// Builds a fully populated box from the eight header values, ordered
    /// xmin, ymin, xmax, ymax, zmin, zmax, mmin, mmax.
    pub fn from_array(values: [f64; 8]) -> BoundingBox {
        BoundingBox {
            x_min: Some(values[0]),
            y_min: Some(values[1]),
            x_max: Some(values[2]),
            y_max: Some(values[3]),
            z_min: Some(values[4]),
            z_max: Some(values[5]),
            m_min: Some(values[6]),
            m_max: Some(values[7]),
        }
    }

    /// The eight values in header order, with unset bounds written as zero.
    pub fn to_array(&self) -> [f64; 8] {
        [
            self.x_min.unwrap_or(0f64),
            self.y_min.unwrap_or(0f64),
            self.x_max.unwrap_or(0f64),
            self.y_max.unwrap_or(0f64),
            self.z_min.unwrap_or(0f64),
            self.z_max.unwrap_or(0f64),
            self.m_min.unwrap_or(0f64),
            self.m_max.unwrap_or(0f64),
        ]
    }

    pub fn get(&self, axis: Axis) -> (Option<f64>, Option<f64>) {
        match axis {
            Axis::X => (self.x_min, self.x_max),
            Axis::Y => (self.y_min, self.y_max),
            Axis::Z => (self.z_min, self.z_max),
            Axis::M => (self.m_min, self.m_max),
        }
    }

    pub fn set(&mut self, axis: Axis, min: Option<f64>, max: Option<f64>) {
        match axis {
            Axis::X => {
                self.x_min = min;
                self.x_max = max;
            }
            Axis::Y => {
                self.y_min = min;
                self.y_max = max;
            }
            Axis::Z => {
                self.z_min = min;
                self.z_max = max;
            }
            Axis::M => {
                self.m_min = min;
                self.m_max = max;
            }
        }
    }

    /// Widens one axis to include `value`. The first value seeds both bounds.
    pub fn expand_to_value(&mut self, axis: Axis, value: f64) {
        let (mut min, mut max) = self.get(axis);
        if min.map_or(true, |v| v > value) {
            min = Some(value);
        }
        if max.map_or(true, |v| v < value) {
            max = Some(value);
        }
        self.set(axis, min, max);
    }

    /// Widens every axis for which the point carries a value.
    pub fn expand_to_point(&mut self, p: &PointZM) {
        for axis in Axis::ALL.iter() {
            if let Some(value) = p.get(*axis) {
                self.expand_to_value(*axis, value);
            }
        }
    }

    /// Widens one axis to cover another box's range on that axis.
    ///
    /// A bound holding exactly zero counts as not yet set and is overwritten
    /// by the incoming value. A dataset whose first extent is legitimately
    /// zero therefore keeps taking the next record's value for that bound.
    pub fn expand_axis_to(&mut self, axis: Axis, other: &BoundingBox) {
        let (other_min, other_max) = other.get(axis);
        let (mut min, mut max) = self.get(axis);
        if let Some(value) = other_min {
            if min.map_or(true, |v| v == 0f64 || v > value) {
                min = Some(value);
            }
        }
        if let Some(value) = other_max {
            if max.map_or(true, |v| v == 0f64 || v < value) {
                max = Some(value);
            }
        }
        self.set(axis, min, max);
    }

    /// True when either measure bound is non-zero. Files whose header carries
    /// a zero measure range omit the measure block of multi-point, polyline
    /// and polygon records.
    pub fn has_measure(&self) -> bool {
        self.m_min.unwrap_or(0f64) != 0f64 || self.m_max.unwrap_or(0f64) != 0f64
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let v = self.to_array();
        write!(
            f,
            "x: [{}, {}], y: [{}, {}], z: [{}, {}], m: [{}, {}]",
            v[0], v[2], v[1], v[3], v[4], v[5], v[6], v[7]
        )
    }
}
