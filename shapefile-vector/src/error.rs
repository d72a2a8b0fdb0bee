/*
This code is part of the shapefile codec library.
Created: 14/10/2026
Last Modified: 15/10/2026
License: MIT
*/
//! The error type shared by the record codec, the attribute table and the
//! `Shapefile` container.

use thiserror::Error;

/// Broad classification of a [`ShapefileError`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ErrorCategory {
    /// The bytes do not describe a valid Shapefile.
    Format,
    /// A file could not be opened, created, read or written.
    Io,
    /// The attribute table rejected a row. Never fatal to a save.
    Attribute,
}

#[derive(Error, Debug)]
pub enum ShapefileError {
    #[error("Not a SHP file (file code mismatch)")]
    NotShapefile,

    #[error("The Shape Type \"{0}\" is not supported.")]
    UnsupportedShapeType(i32),

    #[error("Failed to parse record, read={read}, size={size}")]
    LengthMismatch { read: usize, size: usize },

    #[error("Unexpected end of data while reading {0}")]
    Truncated(String),

    #[error("It wasn't possible to open the {role} file \"{path}\"")]
    OpenFile {
        role: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("It wasn't possible to find the DBase file \"{0}\"")]
    DbaseNotFound(String),

    #[error("It wasn't possible to open the DBase file \"{0}\"")]
    DbaseOpen(String),

    #[error("It wasn't possible to create the DBase file \"{path}\": {reason}")]
    DbaseCreate { path: String, reason: String },

    #[error("Invalid DBase data: {0}")]
    DbaseFormat(String),

    #[error("{0}")]
    Attribute(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShapefileError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ShapefileError::NotShapefile
            | ShapefileError::UnsupportedShapeType(_)
            | ShapefileError::LengthMismatch { .. }
            | ShapefileError::DbaseFormat(_) => ErrorCategory::Format,
            ShapefileError::Attribute(_) => ErrorCategory::Attribute,
            ShapefileError::Truncated(_)
            | ShapefileError::OpenFile { .. }
            | ShapefileError::DbaseNotFound(_)
            | ShapefileError::DbaseOpen(_)
            | ShapefileError::DbaseCreate { .. }
            | ShapefileError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Maps an unexpected end-of-file into `Truncated`, naming what was being
    /// read. Other I/O errors pass through unchanged.
    pub(crate) fn truncated(context: &str) -> impl FnOnce(std::io::Error) -> ShapefileError + '_ {
        move |e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ShapefileError::Truncated(context.to_string())
            } else {
                ShapefileError::Io(e)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ShapefileError>;
