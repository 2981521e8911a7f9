//! Image decoding into a luminance [`Bitmap`] (§4.K).
//!
//! Decoding is delegated to the `image` crate, but the RGBA buffer it
//! produces is converted to luminance by hand (§4.A's formula, not
//! `to_luma8()`'s) so the alpha-premultiply-against-white step runs.

use crate::bitmap::{luminance_bitmap, Bitmap};
use crate::types::PotraceError;

/// Decode `bytes` (any format the `image` crate recognizes) into a
/// luminance bitmap.
///
/// # Errors
///
/// Returns [`PotraceError::ImageLoad`] if the format is unrecognized or the
/// data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<(u32, u32, Bitmap), PotraceError> {
    let image = image::load_from_memory(bytes)?;
    let rgba = image.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    let bitmap = luminance_bitmap(width, height, rgba.as_raw());
    Ok((width, height, bitmap))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(width, height, rgba.to_vec()).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_roundtrips_a_tiny_png() {
        let rgba = [0, 0, 0, 255, 255, 255, 255, 255];
        let png = encode_png(2, 1, &rgba);
        let (width, height, bitmap) = decode(&png).unwrap();
        assert_eq!((width, height), (2, 1));
        assert_eq!(bitmap.data(), &[0, 255]);
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        assert!(decode(b"not an image").is_err());
    }
}
