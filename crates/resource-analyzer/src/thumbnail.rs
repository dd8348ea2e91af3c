//! Thumbnail image processing

use crate::error::{AnalysisError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader, Limits};
use std::io::Cursor;

/// Bounding box thumbnails are scaled down to
pub const THUMBNAIL_WIDTH: u32 = 1280;
pub const THUMBNAIL_HEIGHT: u32 = 720;

/// Largest accepted source dimension, guarding against decompression bombs
pub const MAX_IMAGE_DIMENSION: u32 = 16384;
const MAX_IMAGE_ALLOC: u64 = 512 * 1024 * 1024;

/// Raster image types that are decoded and downscaled
pub const RASTER_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];
/// Vector image type stored as is
pub const SVG_TYPE: &str = "image/svg+xml";

/// Decode raster image data, fix its orientation, shrink it to fit the
/// thumbnail box and encode it again in the same format
///
/// Images already within the box keep their size.
pub fn downscale(data: &[u8], content_type: &str) -> Result<Vec<u8>> {
    let format = match content_type {
        "image/jpeg" => ImageFormat::Jpeg,
        "image/png" => ImageFormat::Png,
        "image/gif" => ImageFormat::Gif,
        other => {
            return Err(AnalysisError::BrokenResource(format!(
                "Unsupported image type {}",
                other
            )))
        }
    };

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_IMAGE_ALLOC);

    let mut reader = ImageReader::with_format(Cursor::new(data), format);
    reader.limits(limits);
    let mut decoder = reader.into_decoder().map_err(broken)?;
    let orientation = decoder.orientation().map_err(broken)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(broken)?;
    image.apply_orientation(orientation);

    if image.width() > THUMBNAIL_WIDTH || image.height() > THUMBNAIL_HEIGHT {
        image = image.resize(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Triangle);
    }

    let mut output = Cursor::new(Vec::new());
    image.write_to(&mut output, format).map_err(broken)?;
    Ok(output.into_inner())
}

fn broken(err: ImageError) -> AnalysisError {
    match err {
        ImageError::Limits(e) => AnalysisError::BrokenResource(format!("Image too large: {}", e)),
        e => AnalysisError::BrokenResource(format!("Bad image data: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{encode, gif_bomb, jpeg_with_orientation};
    use image::GenericImageView;

    fn dimensions(data: &[u8]) -> (u32, u32) {
        image::load_from_memory(data).unwrap().dimensions()
    }

    #[test]
    fn test_downscale_preserves_aspect_ratio() {
        let data = encode(1600, 900, ImageFormat::Png);
        let thumbnail = downscale(&data, "image/png").unwrap();
        assert_eq!(dimensions(&thumbnail), (1280, 720));
        assert_eq!(
            image::guess_format(&thumbnail).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_downscale_tall_image() {
        let data = encode(400, 1440, ImageFormat::Jpeg);
        let thumbnail = downscale(&data, "image/jpeg").unwrap();
        assert_eq!(dimensions(&thumbnail), (200, 720));
        assert_eq!(
            image::guess_format(&thumbnail).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_small_image_keeps_size() {
        let data = encode(64, 32, ImageFormat::Gif);
        let thumbnail = downscale(&data, "image/gif").unwrap();
        assert_eq!(dimensions(&thumbnail), (64, 32));
    }

    #[test]
    fn test_applies_exif_orientation() {
        // Orientation 6: rotate 90 degrees clockwise to display
        let data = jpeg_with_orientation(300, 200, 6);
        let thumbnail = downscale(&data, "image/jpeg").unwrap();
        assert_eq!(dimensions(&thumbnail), (200, 300));

        let data = jpeg_with_orientation(1600, 900, 6);
        let thumbnail = downscale(&data, "image/jpeg").unwrap();
        assert_eq!(dimensions(&thumbnail), (405, 720));

        let data = jpeg_with_orientation(300, 200, 1);
        let thumbnail = downscale(&data, "image/jpeg").unwrap();
        assert_eq!(dimensions(&thumbnail), (300, 200));
    }

    #[test]
    fn test_corrupt_image() {
        let result = downscale(b"not an image", "image/png");
        assert!(matches!(result, Err(AnalysisError::BrokenResource(_))));
    }

    #[test]
    fn test_decompression_bomb() {
        let result = downscale(&gif_bomb(), "image/gif");
        assert!(matches!(result, Err(AnalysisError::BrokenResource(_))));
    }

    #[test]
    fn test_unsupported_type() {
        let result = downscale(b"BM", "image/bmp");
        assert!(matches!(result, Err(AnalysisError::BrokenResource(_))));
    }
}
