//! Pixel formats, row conversion and an owned in-memory raster.
//!
//! Typed interop uses `imgref::ImgVec` with pixels from the `rgb` crate.

use std::fmt;

pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{Rgb, Rgba};

use crate::color::ColorSpace;
use crate::raster::{Raster, RasterError, check_span};

/// Channel arrangement of a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ComponentLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ComponentLayout {
    pub const fn channels(self) -> usize {
        match self {
            ComponentLayout::Gray => 1,
            ComponentLayout::GrayAlpha => 2,
            ComponentLayout::Rgb => 3,
            ComponentLayout::Rgba => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, ComponentLayout::GrayAlpha | ComponentLayout::Rgba)
    }

    pub const fn is_gray(self) -> bool {
        matches!(self, ComponentLayout::Gray | ComponentLayout::GrayAlpha)
    }

    /// Layout with the same color channels and the given alpha presence.
    pub const fn with_alpha(self, alpha: bool) -> Self {
        match (self.is_gray(), alpha) {
            (true, false) => ComponentLayout::Gray,
            (true, true) => ComponentLayout::GrayAlpha,
            (false, false) => ComponentLayout::Rgb,
            (false, true) => ComponentLayout::Rgba,
        }
    }
}

/// Storage size of one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    pub const fn bytes(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }
}

/// Full description of a pixel: layout, sample depth and color space.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelFormat {
    pub layout: ComponentLayout,
    pub depth: BitDepth,
    pub color_space: ColorSpace,
}

impl PixelFormat {
    /// Format with an unspecified (sRGB) color space.
    pub const fn new(layout: ComponentLayout, depth: BitDepth) -> Self {
        Self {
            layout,
            depth,
            color_space: ColorSpace::Unspecified,
        }
    }

    pub const RGB8: Self = Self::new(ComponentLayout::Rgb, BitDepth::Eight);
    pub const RGBA8: Self = Self::new(ComponentLayout::Rgba, BitDepth::Eight);
    pub const RGB16: Self = Self::new(ComponentLayout::Rgb, BitDepth::Sixteen);
    pub const RGBA16: Self = Self::new(ComponentLayout::Rgba, BitDepth::Sixteen);
    pub const GRAY8: Self = Self::new(ComponentLayout::Gray, BitDepth::Eight);
    pub const GRAYA8: Self = Self::new(ComponentLayout::GrayAlpha, BitDepth::Eight);
    pub const GRAY16: Self = Self::new(ComponentLayout::Gray, BitDepth::Sixteen);
    pub const GRAYA16: Self = Self::new(ComponentLayout::GrayAlpha, BitDepth::Sixteen);

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    pub const fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub const fn has_alpha(&self) -> bool {
        self.layout.has_alpha()
    }

    pub const fn bytes_per_pixel(&self) -> usize {
        self.layout.channels() * self.depth.bytes()
    }

    /// Bytes needed for `width` pixels.
    pub const fn row_bytes(&self, width: u32) -> usize {
        width as usize * self.bytes_per_pixel()
    }

    /// Same layout and depth, ignoring color space.
    pub fn same_storage(&self, other: &PixelFormat) -> bool {
        self.layout == other.layout && self.depth == other.depth
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.layout, self.depth.bits())
    }
}

/// Convert `width` pixels from `src` (in `from`) to `dst` (in `to`).
///
/// Gray expands to RGB by replication, RGB reduces to gray with Rec. 709
/// weights, missing alpha becomes opaque and depth changes scale by 257.
/// Color spaces are labels only and are not converted.
pub fn convert_row(from: &PixelFormat, src: &[u8], to: &PixelFormat, dst: &mut [u8], width: u32) {
    let n = width as usize;
    let src = &src[..from.row_bytes(width)];
    let dst = &mut dst[..to.row_bytes(width)];

    if from.same_storage(to) {
        dst.copy_from_slice(src);
        return;
    }

    let (sbpp, dbpp) = (from.bytes_per_pixel(), to.bytes_per_pixel());
    for i in 0..n {
        let px = load_pixel(from, &src[i * sbpp..(i + 1) * sbpp]);
        store_pixel(to, px, &mut dst[i * dbpp..(i + 1) * dbpp]);
    }
}

/// Read one pixel as 16-bit RGBA.
fn load_pixel(format: &PixelFormat, px: &[u8]) -> [u16; 4] {
    let sample = |i: usize| -> u16 {
        match format.depth {
            BitDepth::Eight => u16::from(px[i]) * 257,
            BitDepth::Sixteen => u16::from_ne_bytes([px[2 * i], px[2 * i + 1]]),
        }
    };
    match format.layout {
        ComponentLayout::Gray => {
            let v = sample(0);
            [v, v, v, u16::MAX]
        }
        ComponentLayout::GrayAlpha => {
            let v = sample(0);
            [v, v, v, sample(1)]
        }
        ComponentLayout::Rgb => [sample(0), sample(1), sample(2), u16::MAX],
        ComponentLayout::Rgba => [sample(0), sample(1), sample(2), sample(3)],
    }
}

fn store_pixel(format: &PixelFormat, [r, g, b, a]: [u16; 4], px: &mut [u8]) {
    let luma = || -> u16 {
        let y = (2126 * u32::from(r) + 7152 * u32::from(g) + 722 * u32::from(b) + 5000) / 10000;
        y.min(u32::from(u16::MAX)) as u16
    };
    let mut samples = [0u16; 4];
    let channels = match format.layout {
        ComponentLayout::Gray => {
            samples[0] = luma();
            1
        }
        ComponentLayout::GrayAlpha => {
            samples[0] = luma();
            samples[1] = a;
            2
        }
        ComponentLayout::Rgb => {
            samples[..3].copy_from_slice(&[r, g, b]);
            3
        }
        ComponentLayout::Rgba => {
            samples = [r, g, b, a];
            4
        }
    };
    for (i, &v) in samples[..channels].iter().enumerate() {
        match format.depth {
            BitDepth::Eight => px[i] = ((u32::from(v) + 128) / 257) as u8,
            BitDepth::Sixteen => px[2 * i..2 * i + 2].copy_from_slice(&v.to_ne_bytes()),
        }
    }
}

/// An owned raster stored in a single [`PixelFormat`].
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-filled buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = format.row_bytes(width) * height as usize;
        Self {
            width,
            height,
            format,
            data: vec![0; len],
        }
    }

    /// Wrap packed rows. `data` must hold exactly `height` rows of `width` pixels.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        let expected = format.row_bytes(width) * height as usize;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn from_rgb8(img: ImgRef<'_, Rgb<u8>>) -> Self {
        Self::from_img(img, PixelFormat::RGB8)
    }

    pub fn from_rgba8(img: ImgRef<'_, Rgba<u8>>) -> Self {
        Self::from_img(img, PixelFormat::RGBA8)
    }

    pub fn from_rgb16(img: ImgRef<'_, Rgb<u16>>) -> Self {
        Self::from_img(img, PixelFormat::RGB16)
    }

    pub fn from_rgba16(img: ImgRef<'_, Rgba<u16>>) -> Self {
        Self::from_img(img, PixelFormat::RGBA16)
    }

    fn from_img<T: bytemuck::Pod>(img: ImgRef<'_, T>, format: PixelFormat) -> Self {
        let (buf, width, height) = img.to_contiguous_buf();
        Self {
            width: width as u32,
            height: height as u32,
            format,
            data: bytemuck::cast_slice::<T, u8>(buf.as_ref()).to_vec(),
        }
    }

    /// Copy out as RGB8 if that is the storage format.
    pub fn to_rgb8(&self) -> Option<ImgVec<Rgb<u8>>> {
        self.to_img(&PixelFormat::RGB8)
    }

    /// Copy out as RGBA8 if that is the storage format.
    pub fn to_rgba8(&self) -> Option<ImgVec<Rgba<u8>>> {
        self.to_img(&PixelFormat::RGBA8)
    }

    /// Copy out as RGB16 if that is the storage format.
    pub fn to_rgb16(&self) -> Option<ImgVec<Rgb<u16>>> {
        self.to_img(&PixelFormat::RGB16)
    }

    /// Copy out as RGBA16 if that is the storage format.
    pub fn to_rgba16(&self) -> Option<ImgVec<Rgba<u16>>> {
        self.to_img(&PixelFormat::RGBA16)
    }

    fn to_img<T: bytemuck::Pod>(&self, want: &PixelFormat) -> Option<ImgVec<T>> {
        if !self.format.same_storage(want) {
            return None;
        }
        let pixels: Vec<T> = bytemuck::pod_collect_to_vec(&self.data);
        Some(ImgVec::new(pixels, self.width as usize, self.height as usize))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Packed bytes of row `y`.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let stride = self.format.row_bytes(self.width);
        let start = y as usize * stride;
        (y < self.height).then(|| &self.data[start..start + stride])
    }

    fn span(&self, x: i64, y: i64, width: u32) -> std::ops::Range<usize> {
        let bpp = self.format.bytes_per_pixel();
        let start = y as usize * self.format.row_bytes(self.width) + x as usize * bpp;
        start..start + width as usize * bpp
    }
}

impl Raster for PixelBuffer {
    fn pixel_format(&self) -> &PixelFormat {
        &self.format
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_row(
        &self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &mut [u8],
    ) -> Result<(), RasterError> {
        check_span(x, y, width, self.dimensions())?;
        let expected = format.row_bytes(width);
        if row.len() < expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: row.len(),
            });
        }
        let span = self.span(x, y, width);
        convert_row(&self.format, &self.data[span], format, row, width);
        Ok(())
    }

    fn write_row(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        format: &PixelFormat,
        row: &[u8],
    ) -> Result<(), RasterError> {
        check_span(x, y, width, self.dimensions())?;
        let expected = format.row_bytes(width);
        if row.len() < expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: row.len(),
            });
        }
        let span = self.span(x, y, width);
        let storage = self.format.clone();
        convert_row(format, row, &storage, &mut self.data[span], width);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(PixelFormat::RGBA16.bytes_per_pixel(), 8);
        assert_eq!(PixelFormat::GRAYA8.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::RGB8.row_bytes(5), 15);
        assert_eq!(ComponentLayout::Gray.with_alpha(true), ComponentLayout::GrayAlpha);
        assert_eq!(ComponentLayout::Rgba.with_alpha(false), ComponentLayout::Rgb);
    }

    #[test]
    fn gray_to_rgba_replicates_and_adds_opaque_alpha() {
        let mut dst = [0u8; 8];
        convert_row(&PixelFormat::GRAY8, &[10, 200], &PixelFormat::RGBA8, &mut dst, 2);
        assert_eq!(dst, [10, 10, 10, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn rgb_to_gray_uses_luma_weights() {
        let mut dst = [0u8; 3];
        convert_row(
            &PixelFormat::RGB8,
            &[255, 0, 0, 0, 255, 0, 255, 255, 255],
            &PixelFormat::GRAY8,
            &mut dst,
            3,
        );
        assert_eq!(dst, [54, 182, 255]);
    }

    #[test]
    fn depth_scaling_roundtrips() {
        let src: Vec<u8> = (0..=255).collect();
        let mut wide = vec![0u8; 512];
        convert_row(&PixelFormat::GRAY8, &src, &PixelFormat::GRAY16, &mut wide, 256);
        let v = u16::from_ne_bytes([wide[2 * 0x80], wide[2 * 0x80 + 1]]);
        assert_eq!(v, 0x8080);
        let mut back = vec![0u8; 256];
        convert_row(&PixelFormat::GRAY16, &wide, &PixelFormat::GRAY8, &mut back, 256);
        assert_eq!(back, src);
    }

    #[test]
    fn buffer_rows_convert_on_access() {
        let mut buf = PixelBuffer::new(2, 2, PixelFormat::RGBA16);
        buf.write_row(0, 1, 2, &PixelFormat::GRAY8, &[0, 255]).unwrap();
        let mut out = [0u8; 6];
        buf.read_row(0, 1, 2, &PixelFormat::RGB8, &mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 255, 255, 255]);
        let img = buf.to_rgba16().unwrap();
        assert_eq!(img.buf()[2], Rgba::new(0, 0, 0, 65535));
        assert!(buf.to_rgba8().is_none());
    }

    #[test]
    fn buffer_rejects_out_of_bounds() {
        let mut buf = PixelBuffer::new(2, 2, PixelFormat::GRAY8);
        let err = buf.write_row(1, 0, 2, &PixelFormat::GRAY8, &[0, 0]).unwrap_err();
        assert!(matches!(err, RasterError::OutOfBounds { .. }));
        let err = buf.write_row(0, 0, 2, &PixelFormat::GRAY8, &[0]).unwrap_err();
        assert!(matches!(err, RasterError::BufferSize { expected: 2, actual: 1 }));
    }

    #[test]
    fn typed_roundtrip() {
        let px = vec![Rgb::new(1u8, 2, 3), Rgb::new(4, 5, 6)];
        let buf = PixelBuffer::from_rgb8(ImgRef::new(&px, 2, 1));
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.to_rgb8().unwrap().buf(), &px);
    }
}
