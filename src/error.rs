//! Unified error types for decode, query and encode.

use std::io;

use thiserror::Error;

use crate::raster::RasterError;

/// Unified error type for PNG codec operations.
///
/// Every failure aborts the current call. Rows already handed to a
/// destination raster before the failure are not rolled back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Stream read, write or flush failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Fewer than eight bytes were available for the signature.
    #[error("too short for a png file, only {0} bytes")]
    TooShort(usize),

    /// The first eight bytes are not the PNG signature.
    #[error("wrong png header")]
    BadMagic,

    /// The header declares a color type / bit depth pair that PNG does not define.
    #[error("unsupported png format: color type {color_type}, bit depth {bit_depth}")]
    UnsupportedFormat { color_type: u8, bit_depth: u8 },

    /// The embedded ICC profile could not be inflated or parsed.
    #[error("color space error: {0}")]
    ColorSpace(String),

    /// Corrupt or structurally invalid bitstream.
    #[error("png bitstream error: {0}")]
    Bitstream(#[source] Box<dyn core::error::Error + Send + Sync>),

    /// Resource limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Caller-supplied arguments are inconsistent (region, buffer sizes).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The destination or source raster rejected a row transfer.
    #[error(transparent)]
    Raster(#[from] RasterError),
}

impl CodecError {
    /// Wrap a structural problem found outside the bitstream library.
    pub(crate) fn bitstream(msg: impl Into<String>) -> Self {
        CodecError::Bitstream(msg.into().into())
    }

    /// Classify an error surfaced by the `png` decoder.
    pub(crate) fn from_decoding(error: png::DecodingError) -> Self {
        match error {
            png::DecodingError::IoError(e) => CodecError::Io(e),
            png::DecodingError::LimitsExceeded => {
                CodecError::LimitExceeded("png decoder memory limit".into())
            }
            other => CodecError::Bitstream(Box::new(other)),
        }
    }

    /// Classify an error surfaced by the `png` encoder.
    pub(crate) fn from_encoding(error: png::EncodingError) -> Self {
        match error {
            png::EncodingError::IoError(e) => CodecError::Io(e),
            png::EncodingError::LimitsExceeded => {
                CodecError::LimitExceeded("png encoder limit".into())
            }
            other => CodecError::Bitstream(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_reports_count() {
        let msg = CodecError::TooShort(3).to_string();
        assert_eq!(msg, "too short for a png file, only 3 bytes");
    }

    #[test]
    fn decoding_io_maps_to_io() {
        let e = png::DecodingError::IoError(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(matches!(CodecError::from_decoding(e), CodecError::Io(_)));
    }

    #[test]
    fn bitstream_keeps_message() {
        let e = CodecError::bitstream("first chunk is not IHDR");
        assert!(e.to_string().contains("first chunk is not IHDR"));
    }
}
