//! Compression support for APT index files.

use crate::{AptIndexError, Result};
use std::io::{Read, Write};

/// Compression formats a mirror may serve an index in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Gzip compression.
    Gzip,
    /// Bzip2 compression.
    Bzip2,
}

impl Compression {
    /// Get the file extension for this compression format.
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::Bzip2 => ".bz2",
        }
    }

    /// Compress data using this compression format.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut compressed = Vec::new();
                let mut encoder =
                    flate2::write::GzEncoder::new(&mut compressed, flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()?;
                Ok(compressed)
            }
            Compression::Bzip2 => {
                let mut compressed = Vec::new();
                let mut encoder =
                    bzip2::write::BzEncoder::new(&mut compressed, bzip2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()?;
                Ok(compressed)
            }
        }
    }

    /// Decompress data using this compression format.
    ///
    /// A truncated or corrupt stream is reported as
    /// [`AptIndexError::Compression`] rather than a plain I/O error.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decompressed = Vec::new();
        let outcome = match self {
            Compression::None => return Ok(data.to_vec()),
            Compression::Gzip => flate2::read::GzDecoder::new(data).read_to_end(&mut decompressed),
            Compression::Bzip2 => bzip2::read::BzDecoder::new(data).read_to_end(&mut decompressed),
        };
        outcome.map_err(|e| AptIndexError::Compression(format!("{}: {}", self, e)))?;
        Ok(decompressed)
    }

    /// Decompress data and decode it as UTF-8 text.
    pub fn decode_text(&self, data: &[u8]) -> Result<String> {
        Ok(String::from_utf8(self.decompress(data)?)?)
    }

    /// Formats in the order a client should try them: smallest transfer first.
    pub fn preferred_order() -> &'static [Compression] {
        &[Compression::Gzip, Compression::Bzip2, Compression::None]
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_extensions() {
        assert_eq!(Compression::None.extension(), "");
        assert_eq!(Compression::Gzip.extension(), ".gz");
        assert_eq!(Compression::Bzip2.extension(), ".bz2");
    }

    #[test]
    fn test_gzip_decode_text() -> Result<()> {
        let compressed = Compression::Gzip.compress(b"Package: hello\n")?;
        assert_ne!(compressed, b"Package: hello\n");

        assert_eq!(Compression::Gzip.decode_text(&compressed)?, "Package: hello\n");
        Ok(())
    }

    #[test]
    fn test_bzip2_decode_text() -> Result<()> {
        let compressed = Compression::Bzip2.compress(b"Package: hello\n")?;
        assert_eq!(Compression::Bzip2.decode_text(&compressed)?, "Package: hello\n");
        Ok(())
    }

    #[test]
    fn test_corrupt_gzip_is_compression_error() {
        let err = Compression::Gzip.decompress(b"definitely not gzip").unwrap_err();
        assert!(matches!(err, AptIndexError::Compression(_)));
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let err = Compression::None.decode_text(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, AptIndexError::Encoding(_)));
    }

    #[test]
    fn test_preferred_order() {
        assert_eq!(
            Compression::preferred_order(),
            &[Compression::Gzip, Compression::Bzip2, Compression::None]
        );
    }
}
