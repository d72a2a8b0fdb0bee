// private sub-module defined in other files
mod bounding_box;
mod point_zm;

// exports identifiers from private sub-modules in the current module namespace
pub use self::bounding_box::BoundingBox;
pub use self::point_zm::PointZM;

/// The four coordinate dimensions a Shapefile can carry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
    M,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::M];
}
