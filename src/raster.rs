//! Row-addressable raster abstraction used as decode destination and encode source.

use thiserror::Error;

use crate::pixel::PixelFormat;

/// Errors raised by a [`Raster`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RasterError {
    /// The requested row span lies outside the raster.
    #[error("row span x={x} y={y} width={width} outside {raster_width}x{raster_height} raster")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        raster_width: u32,
        raster_height: u32,
    },

    /// The caller's buffer does not match `width` pixels of the requested format.
    #[error("row buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    /// The raster cannot produce or accept the requested pixel format.
    #[error("raster cannot convert to {0}")]
    Unsupported(String),
}

/// A 2-D pixel store that transfers whole row spans in a requested format.
///
/// `row` buffers hold `width` pixels packed in `format`; 16-bit samples are
/// native-endian `u16`. Implementations convert between their storage
/// format and `format` as needed.
pub trait Raster {
    /// Format the raster natively stores.
    fn pixel_format(&self) -> &PixelFormat;

    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Copy `width` pixels starting at `(x, y)` into `row`.
    fn read_row(
        &self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &mut [u8],
    ) -> Result<(), RasterError>;

    /// Store `width` pixels from `row` starting at `(x, y)`.
    fn write_row(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &[u8],
    ) -> Result<(), RasterError>;
}

impl<T: Raster + ?Sized> Raster for &mut T {
    fn pixel_format(&self) -> &PixelFormat {
        (**self).pixel_format()
    }

    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn read_row(
        &self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &mut [u8],
    ) -> Result<(), RasterError> {
        (**self).read_row(x, y, width, format, row)
    }

    fn write_row(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &[u8],
    ) -> Result<(), RasterError> {
        (**self).write_row(x, y, width, format, row)
    }
}

/// A rectangle of a raster, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of a `width` × `height` raster.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region lies entirely inside a `width` × `height` raster.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let end = |start: i64, len: u32| start.checked_add(i64::from(len));
        self.x >= 0
            && self.y >= 0
            && end(self.x, self.width).is_some_and(|e| e <= i64::from(width))
            && end(self.y, self.height).is_some_and(|e| e <= i64::from(height))
    }
}

/// Check that a row span lies inside a raster of `dims`.
pub(crate) fn check_span(x: i64, y: i64, width: u32, dims: (u32, u32)) -> Result<(), RasterError> {
    if Region::new(x, y, width, 1).fits_within(dims.0, dims.1) {
        Ok(())
    } else {
        Err(RasterError::OutOfBounds {
            x,
            y,
            width,
            raster_width: dims.0,
            raster_height: dims.1,
        })
    }
}
