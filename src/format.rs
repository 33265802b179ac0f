//! PNG signature validation and format identification.

use std::io::{Read, Seek};

use crate::CodecError;
use crate::stream::SourceStream;

/// The first eight bytes of every PNG file.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Image formats this crate reads and writes.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
}

impl ImageFormat {
    /// Detect format from magic bytes. Returns None if unrecognized.
    pub fn detect(data: &[u8]) -> Option<Self> {
        is_png(data).then_some(ImageFormat::Png)
    }

    /// Detect format from file extension (case-insensitive, leading dot allowed).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Detect format from a MIME type (case-insensitive).
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        mime.eq_ignore_ascii_case("image/png").then_some(ImageFormat::Png)
    }

    /// MIME type string.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
        }
    }

    /// Common file extensions, lowercase, without the dot.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Png => &["png"],
        }
    }
}

/// Whether `data` starts with the PNG signature.
pub fn is_png(data: &[u8]) -> bool {
    data.len() >= PNG_SIGNATURE.len() && data[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// Consume the eight signature bytes from the current stream position.
///
/// Fails with [`CodecError::TooShort`] carrying the number of bytes that were
/// available, or [`CodecError::BadMagic`] if all eight arrived but differ.
pub(crate) fn check_signature<R: Read + Seek>(
    stream: &mut SourceStream<R>,
) -> Result<(), CodecError> {
    let mut header = [0u8; 8];
    let n = stream.read_full(&mut header)?;
    if n < header.len() {
        return Err(CodecError::TooShort(n));
    }
    if header != PNG_SIGNATURE {
        return Err(CodecError::BadMagic);
    }
    Ok(())
}
