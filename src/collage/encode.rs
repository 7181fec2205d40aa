use image::buffer::ConvertBuffer;
use image::{ColorType, ImageEncoder, RgbImage, RgbaImage, codecs::jpeg::JpegEncoder};

use super::CollageError;

pub const JPEG_QUALITY: u8 = 95;

/// Flatten the canvas to RGB and encode it as JPEG.
pub fn encode_jpeg(canvas: &RgbaImage, quality: u8) -> Result<Vec<u8>, CollageError> {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return Err(CollageError::Encode(format!("empty canvas {w}x{h}")));
    }
    let rgb: RgbImage = canvas.convert();

    let mut buf: Vec<u8> = Vec::new();
    {
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .write_image(rgb.as_raw(), w, h, ColorType::Rgb8.into())
            .map_err(|e| CollageError::Encode(e.to_string()))?;
    }
    if buf.is_empty() {
        return Err(CollageError::Encode("encoder produced no data".to_string()));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_decodable_jpeg() {
        let canvas = RgbaImage::from_pixel(64, 32, image::Rgba([10, 200, 30, 255]));
        let bytes = encode_jpeg(&canvas, JPEG_QUALITY).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (64, 32));
        let px = back.get_pixel(32, 16).0;
        assert!(px[1] > 180 && px[0] < 40, "unexpected pixel {px:?}");
    }

    #[test]
    fn empty_canvas_fails_to_encode() {
        let canvas = RgbaImage::new(0, 0);
        assert!(matches!(
            encode_jpeg(&canvas, JPEG_QUALITY),
            Err(CollageError::Encode(_))
        ));
    }
}
