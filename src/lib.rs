//! # pngstream
//!
//! Streaming PNG decode and encode against row-addressable rasters, with
//! color-space negotiation from the iCCP, sRGB, gAMA and cHRM chunks.
//!
//! Pixels move one row at a time between a caller's byte stream and a
//! [`Raster`]; neither side is ever held in memory whole. Interlaced (Adam7)
//! files are decoded pass by pass; files are always written sequentially.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::fs::File;
//! use pngstream::{EncodeRequest, PixelBuffer, Region};
//!
//! // Inspect, then decode into a buffer of the negotiated format
//! let mut input = File::open("in.png")?;
//! let info = pngstream::query(&mut input)?;
//! let mut buffer = PixelBuffer::new(info.width, info.height, info.pixel_format.clone());
//! let mut input = File::open("in.png")?;
//! pngstream::decode(&mut input, &mut buffer, (0, 0), None)?;
//!
//! // Write the top half back out as 8-bit
//! let mut output = File::create("out.png")?;
//! let top = Region::new(0, 0, info.width, info.height / 2);
//! pngstream::encode(&buffer, top, &mut output, 6, 8)?;
//!
//! // Or with the builder
//! let bytes = EncodeRequest::new().with_bit_depth(16).encode_to_vec(&buffer)?;
//! # Ok::<(), pngstream::CodecError>(())
//! ```

#![forbid(unsafe_code)]

mod chunks;
pub mod color;
pub mod config;
mod decode;
mod encode;
mod error;
mod format;
mod info;
mod interlace;
mod limits;
mod negotiate;
pub mod pixel;
pub mod raster;
mod registry;
mod stream;

pub use color::{
    Chromaticity, ChromaticitySpace, ColorSpace, IccColorModel, IccProfile, TransferCurve,
};
pub use config::EncodeConfig;
pub use decode::{DecodeOutput, DecodeRequest, decode};
pub use encode::{EncodeOutput, EncodeRequest, encode};
pub use error::CodecError;
pub use format::{ImageFormat, PNG_SIGNATURE, is_png};
pub use info::{ImageDescriptor, query};
pub use limits::Limits;
pub use pixel::{BitDepth, ComponentLayout, PixelBuffer, PixelFormat, convert_row};
pub use raster::{Raster, RasterError, Region};
pub use registry::CodecRegistry;
