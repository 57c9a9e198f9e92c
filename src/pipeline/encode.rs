//! Image encoding: downloaded bytes → `DynamicImage` → printpdf `RawImage`.
//!
//! Newsletters serve PNG, JPEG and the odd GIF. Everything is flattened to
//! 8-bit RGB before embedding; the PDF has a white background so dropping the
//! alpha channel matches what a reader sees in the mail client.

use image::DynamicImage;
use printpdf::{RawImage, RawImageData, RawImageFormat};
use tracing::debug;

/// Decode raw bytes, sniffing the format from the content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    debug!(
        "Decoded image {}x{} from {} bytes",
        img.width(),
        img.height(),
        bytes.len()
    );
    Ok(img)
}

/// Convert a decoded image into the form printpdf embeds.
pub fn to_raw_image(img: &DynamicImage) -> RawImage {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: width as usize,
        height: height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode should succeed");
        buf
    }

    #[test]
    fn decode_png() {
        let img = decode_image(&png_bytes(8, 4)).expect("valid png");
        assert_eq!((img.width(), img.height()), (8, 4));
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(decode_image(b"<html>not an image</html>").is_err());
    }

    #[test]
    fn raw_image_is_rgb8() {
        let img = decode_image(&png_bytes(3, 2)).unwrap();
        let raw = to_raw_image(&img);
        assert_eq!((raw.width, raw.height), (3, 2));
        assert_eq!(raw.data_format, RawImageFormat::RGB8);
        match raw.pixels {
            RawImageData::U8(px) => {
                assert_eq!(px.len(), 3 * 2 * 3);
                assert_eq!(&px[..3], &[255, 0, 0]);
            }
            other => panic!("unexpected pixel data {other:?}"),
        }
    }
}
