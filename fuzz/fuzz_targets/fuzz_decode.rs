#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use pngstream::{DecodeRequest, Limits, PixelBuffer};

fuzz_target!(|data: &[u8]| {
    let limits = Limits::new().with_max_pixels(1 << 20).with_max_memory(64 << 20);
    let Ok(info) = pngstream::query(&mut Cursor::new(data)) else {
        return;
    };
    if limits.check_header(info.width, info.height).is_err() {
        return;
    }
    let mut dest = PixelBuffer::new(info.width, info.height, info.pixel_format);
    let _ = DecodeRequest::new(&mut Cursor::new(data))
        .with_limits(&limits)
        .decode_into(&mut dest);
});
