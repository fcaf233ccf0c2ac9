use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, RgbaImage};

use crate::backend::FrameCapture;
use crate::error::{Result, ViewerError};

const PNG_PREFIX: &str = "data:image/png;base64,";

/// Encode captured pixels as a `data:image/png;base64,` URI
pub fn png_data_uri(capture: &FrameCapture) -> Result<String> {
    let img = RgbaImage::from_raw(capture.width, capture.height, capture.rgba.clone())
        .ok_or_else(|| {
            ViewerError::Encode(format!(
                "pixel buffer of {} bytes does not match {}x{}",
                capture.rgba.len(),
                capture.width,
                capture.height
            ))
        })?;

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    let mut uri = String::with_capacity(PNG_PREFIX.len() + png.len() * 4 / 3 + 4);
    uri.push_str(PNG_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(&png, &mut uri);
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_data_uri_roundtrips_pixels() {
        let capture = FrameCapture::solid(4, 2, [240, 240, 240, 255]);
        let uri = png_data_uri(&capture).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let payload = &uri[PNG_PREFIX.len()..];
        let png = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(3, 1).0, [240, 240, 240, 255]);
    }

    #[test]
    fn test_short_buffer_is_encode_error() {
        let capture = FrameCapture {
            width: 4,
            height: 4,
            rgba: vec![0; 8],
        };
        assert!(matches!(png_data_uri(&capture), Err(ViewerError::Encode(_))));
    }
}
