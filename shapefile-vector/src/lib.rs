/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT
*/

pub mod error;
pub mod shapefile;

// exports identifiers from sub-modules in the current module namespace
pub use crate::error::{ErrorCategory, Result, ShapefileError};
pub use crate::shapefile::attributes::*;
pub use crate::shapefile::geometry::*;
pub use crate::shapefile::header::{read_index_file, IndexEntry, ShapefileHeader};
pub use crate::shapefile::Shapefile;
pub use shapefile_common::configs::Configs;
pub use shapefile_common::structures::{Axis, BoundingBox, PointZM};
