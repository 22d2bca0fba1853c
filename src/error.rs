//! Error types for reading library exports

use thiserror::Error;

use crate::record::FieldKind;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input stream could not be fully consumed.
    #[error("Failed to read library data: {0}")]
    Read(#[from] std::io::Error),

    /// The input is not a property list or does not have the shape of a library.
    #[error("Failed to decode library: {0}")]
    Decode(#[from] DecodeError),

    #[error("No track with id: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid property list: {0}")]
    Plist(#[from] plist::Error),

    /// A container value (dictionary or array) was expected.
    #[error("{path}: expected {expected}, found {found}")]
    Shape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A scalar value does not match the kind of the field it maps to.
    #[error("{path}: expected {expected} value, found {found}")]
    TypeMismatch {
        path: String,
        expected: FieldKind,
        found: &'static str,
    },
}

impl DecodeError {
    /// Path of the offending value inside the document, e.g. `Tracks/1234/Play Count`.
    ///
    /// Empty for errors raised by the property list parser itself.
    pub fn path(&self) -> &str {
        match self {
            Self::Plist(_) => "",
            Self::Shape { path, .. } | Self::TypeMismatch { path, .. } => path,
        }
    }
}
