use super::Axis;
use std::fmt;

/// A point with x and y fields and optional z and measure values.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct PointZM {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl PointZM {
    /// Creates a new planar PointZM.
    pub fn new(x: f64, y: f64) -> PointZM {
        PointZM {
            x: x,
            y: y,
            z: None,
            m: None,
        }
    }

    pub fn with_z(mut self, z: f64) -> PointZM {
        self.z = Some(z);
        self
    }

    pub fn with_m(mut self, m: f64) -> PointZM {
        self.m = Some(m);
        self
    }

    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => Some(self.x),
            Axis::Y => Some(self.y),
            Axis::Z => self.z,
            Axis::M => self.m,
        }
    }
}

impl fmt::Display for PointZM {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(x: {}, y: {}", self.x, self.y)?;
        if let Some(z) = self.z {
            write!(f, ", z: {}", z)?;
        }
        if let Some(m) = self.m {
            write!(f, ", m: {}", m)?;
        }
        write!(f, ")")
    }
}
