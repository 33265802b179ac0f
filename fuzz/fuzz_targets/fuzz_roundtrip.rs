#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pngstream::{BitDepth, ComponentLayout, EncodeRequest, PixelBuffer, PixelFormat};

#[derive(Arbitrary, Debug)]
struct Input {
    width: u8,
    height: u8,
    layout: u8,
    sixteen: bool,
    level: u8,
    seed: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let (w, h) = (u32::from(input.width) + 1, u32::from(input.height) + 1);
    let layout = match input.layout % 4 {
        0 => ComponentLayout::Gray,
        1 => ComponentLayout::GrayAlpha,
        2 => ComponentLayout::Rgb,
        _ => ComponentLayout::Rgba,
    };
    let depth = if input.sixteen { BitDepth::Sixteen } else { BitDepth::Eight };
    let format = PixelFormat::new(layout, depth);
    let len = format.row_bytes(w) * h as usize;
    let data: Vec<u8> = if input.seed.is_empty() {
        vec![0; len]
    } else {
        input.seed.iter().copied().cycle().take(len).collect()
    };
    let source = PixelBuffer::from_raw(w, h, format.clone(), data).unwrap();

    let png = EncodeRequest::new()
        .with_compression_level(input.level % 9 + 1)
        .with_bit_depth(u32::from(depth.bits()))
        .encode_to_vec(&source)
        .unwrap();

    let mut dest = PixelBuffer::new(w, h, format);
    pngstream::decode(&mut Cursor::new(&png), &mut dest, (0, 0), None).unwrap();
    assert_eq!(dest.as_bytes(), source.as_bytes());
});
