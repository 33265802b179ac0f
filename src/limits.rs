//! Caps applied to PNG headers and row buffers before any pixel work starts.

use crate::CodecError;

/// Upper bounds checked against the IHDR and against the row buffers a
/// decode or encode would allocate.
///
/// Unset fields are unbounded. `max_memory_bytes` also caps the `png`
/// decoder's own allocations (zlib window, chunk buffers).
///
/// ```
/// use pngstream::Limits;
///
/// let limits = Limits::new().with_max_pixels(4096 * 4096).with_max_memory(64 << 20);
/// assert!(limits.check_header(4096, 4096).is_ok());
/// assert!(limits.check_header(4097, 4096).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Width × height.
    pub max_pixels: Option<u64>,
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// No bounds at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_dimensions(mut self, width: u64, height: u64) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Reject an image whose declared size is over any bound.
    pub fn check_header(&self, width: u32, height: u32) -> Result<(), CodecError> {
        let (w, h) = (u64::from(width), u64::from(height));
        let over = |value: u64, max: Option<u64>| max.is_some_and(|m| value > m);
        let reason = if over(w, self.max_width) {
            "width"
        } else if over(h, self.max_height) {
            "height"
        } else if over(w * h, self.max_pixels) {
            "pixel count"
        } else {
            return Ok(());
        };
        Err(CodecError::LimitExceeded(format!(
            "{} of {}x{} image over limit",
            reason, width, height
        )))
    }

    /// Reject row buffers totalling `bytes`.
    pub fn check_row_buffers(&self, bytes: u64) -> Result<(), CodecError> {
        match self.max_memory_bytes {
            Some(max) if bytes > max => Err(CodecError::LimitExceeded(format!(
                "row buffers need {} bytes, limit is {}",
                bytes, max
            ))),
            _ => Ok(()),
        }
    }

    /// Allocation cap for the `png` decoder.
    pub(crate) fn to_png(&self) -> png::Limits {
        let mut limits = png::Limits::default();
        if let Some(max) = self.max_memory_bytes {
            limits.bytes = usize::try_from(max).unwrap_or(usize::MAX);
        }
        limits
    }
}
