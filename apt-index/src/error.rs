//! Error types for the APT index library.

/// Result type for APT index operations.
pub type Result<T> = std::result::Result<T, AptIndexError>;

/// Errors that can occur when reading APT archive indexes.
#[derive(Debug, thiserror::Error)]
pub enum AptIndexError {
    /// I/O error occurred while reading index data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The index body could not be decompressed.
    #[error("Compression error: {0}")]
    Compression(String),

    /// The index body is not valid UTF-8.
    #[error("Index is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Invalid package control data.
    #[error("Invalid package data: {0}")]
    InvalidPackageData(String),

    /// Missing required field.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid field value.
    #[error("Invalid field value for '{field}': {value}")]
    InvalidField { field: String, value: String },
}

impl AptIndexError {
    /// Create a new invalid package data error.
    pub fn invalid_package<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPackageData(msg.into())
    }

    /// Create a new missing field error.
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a new invalid field error.
    pub fn invalid_field<S: Into<String>>(field: S, value: S) -> Self {
        Self::InvalidField {
            field: field.into(),
            value: value.into(),
        }
    }
}
