//! Mapping between PNG header fields and [`PixelFormat`]s.

use crate::CodecError;
use crate::chunks::RawHeader;
use crate::color::ColorSpace;
use crate::pixel::{BitDepth, ComponentLayout, PixelFormat};

const GRAY: u8 = 0;
const RGB: u8 = 2;
const INDEXED: u8 = 3;
const GRAY_ALPHA: u8 = 4;
const RGBA: u8 = 6;

/// Whether `(color_type, bit_depth)` is a combination PNG defines.
pub(crate) fn is_valid_combination(color_type: u8, bit_depth: u8) -> bool {
    match color_type {
        GRAY => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
        INDEXED => matches!(bit_depth, 1 | 2 | 4 | 8),
        RGB | GRAY_ALPHA | RGBA => matches!(bit_depth, 8 | 16),
        _ => false,
    }
}

/// Pixel format a decode of `header` produces before any caller override.
///
/// tRNS adds alpha, palettes expand to RGB, and sub-byte gray widens to 8 bits.
pub(crate) fn decode_format(
    header: &RawHeader,
    has_transparency: bool,
    color_space: ColorSpace,
) -> Result<PixelFormat, CodecError> {
    if !is_valid_combination(header.color_type, header.bit_depth) {
        return Err(CodecError::UnsupportedFormat {
            color_type: header.color_type,
            bit_depth: header.bit_depth,
        });
    }
    let layout = match header.color_type {
        GRAY => ComponentLayout::Gray.with_alpha(has_transparency),
        GRAY_ALPHA => ComponentLayout::GrayAlpha,
        INDEXED | RGB => ComponentLayout::Rgb.with_alpha(has_transparency),
        _ => ComponentLayout::Rgba,
    };
    let depth = if header.bit_depth == 16 {
        BitDepth::Sixteen
    } else {
        BitDepth::Eight
    };
    Ok(PixelFormat {
        layout,
        depth,
        color_space,
    })
}

/// Pixel format to encode a source declared as `source`, at the requested depth.
///
/// Only a request for 16 bits keeps 16; every other value means 8.
pub(crate) fn encode_format(source: &PixelFormat, requested_depth: u32) -> PixelFormat {
    let depth = if requested_depth == 16 {
        BitDepth::Sixteen
    } else {
        BitDepth::Eight
    };
    PixelFormat {
        layout: source.layout,
        depth,
        color_space: source.color_space.clone(),
    }
}

pub(crate) fn png_color_type(layout: ComponentLayout) -> png::ColorType {
    match layout {
        ComponentLayout::Gray => png::ColorType::Grayscale,
        ComponentLayout::GrayAlpha => png::ColorType::GrayscaleAlpha,
        ComponentLayout::Rgb => png::ColorType::Rgb,
        ComponentLayout::Rgba => png::ColorType::Rgba,
    }
}

pub(crate) fn png_bit_depth(depth: BitDepth) -> png::BitDepth {
    match depth {
        BitDepth::Eight => png::BitDepth::Eight,
        BitDepth::Sixteen => png::BitDepth::Sixteen,
    }
}

/// Layout the `png` reader reports for its expanded output.
pub(crate) fn layout_of(color_type: png::ColorType) -> ComponentLayout {
    match color_type {
        png::ColorType::Grayscale => ComponentLayout::Gray,
        png::ColorType::GrayscaleAlpha => ComponentLayout::GrayAlpha,
        png::ColorType::Rgb | png::ColorType::Indexed => ComponentLayout::Rgb,
        png::ColorType::Rgba => ComponentLayout::Rgba,
    }
}
