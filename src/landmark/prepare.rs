use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use super::error::LandmarkError;

/// Maximum length of the longer image edge sent to the vision service.
pub const MAX_DIMENSION: u32 = 640;

/// JPEG quality for the transport encoding.
const JPEG_QUALITY: u8 = 100;

/// Scales an image so its longer edge equals `max_dimension`, preserving the
/// aspect ratio. The shorter edge is computed with truncating rounding, so a
/// 1200x800 image bounded at 640 comes out 640x426. Square images become
/// `max_dimension` on both sides.
pub fn scale_down(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = scaled_dimensions(image.width(), image.height(), max_dimension);
    image.resize_exact(width, height, FilterType::Triangle)
}

pub(crate) fn scaled_dimensions(
    original_width: u32,
    original_height: u32,
    max_dimension: u32,
) -> (u32, u32) {
    if original_height > original_width {
        let resized_height = max_dimension;
        let resized_width =
            (resized_height as f32 * original_width as f32 / original_height as f32) as u32;
        (resized_width, resized_height)
    } else if original_width > original_height {
        let resized_width = max_dimension;
        let resized_height =
            (resized_width as f32 * original_height as f32 / original_width as f32) as u32;
        (resized_width, resized_height)
    } else {
        (max_dimension, max_dimension)
    }
}

/// Re-encodes the image as JPEG at maximum quality.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, LandmarkError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    image
        .write_with_encoder(encoder)
        .map_err(|e| LandmarkError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Encodes bytes as standard base64 with no line wrapping.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_landscape_scaling_truncates() {
        assert_eq!(scaled_dimensions(1200, 800, 640), (640, 426));
    }

    #[test]
    fn test_portrait_scaling_is_symmetric() {
        assert_eq!(scaled_dimensions(800, 1200, 640), (426, 640));
    }

    #[test]
    fn test_square_images_hit_the_bound_exactly() {
        assert_eq!(scaled_dimensions(1000, 1000, 640), (640, 640));
        assert_eq!(scaled_dimensions(100, 100, 640), (640, 640));
    }

    #[test]
    fn test_scale_down_produces_bounded_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1200, 800));
        let scaled = scale_down(&image, 640);
        assert_eq!((scaled.width(), scaled.height()), (640, 426));
    }

    #[test]
    fn test_jpeg_round_trip_decodes() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, image::Rgb([120, 30, 200])));
        let bytes = encode_jpeg(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_base64_has_no_line_wrapping() {
        let encoded = encode_base64(&[0u8; 120]);
        assert!(!encoded.contains('\n'));
        assert!(!encoded.contains('\r'));
    }
}
