use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use std::path::Path;

use crate::carousel::MediaKind;
use crate::error::{Error, Result};

/// Photo formats accepted for upload (re-encoded as JPEG)
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Video formats accepted for upload (stored as-is)
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "m4v", "webm"];

/// Classify a file by extension
pub fn detect_kind(path: &Path) -> Result<MediaKind> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .ok_or_else(|| Error::UnsupportedMedia(path.to_path_buf()))?;

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(MediaKind::Video { thumbnail: None })
    } else {
        Err(Error::UnsupportedMedia(path.to_path_buf()))
    }
}

/// A photo ready to be stored
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode a photo, shrink it so its longest side fits `max_dimension`
/// (never enlarging) and re-encode it as JPEG.
pub fn compress_image(bytes: &[u8], max_dimension: u32, quality: u8) -> Result<CompressedImage> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();

    let img = if width.max(height) > max_dimension {
        // resize() keeps the aspect ratio and fits inside the box
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };
    let (width, height) = img.dimensions();

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(&rgb)?;

    Ok(CompressedImage { jpeg, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind(Path::new("a/IMG_1.JPG")).unwrap(), MediaKind::Image);
        assert_eq!(
            detect_kind(Path::new("clip.mov")).unwrap(),
            MediaKind::Video { thumbnail: None }
        );
        assert!(matches!(detect_kind(Path::new("notes.txt")), Err(Error::UnsupportedMedia(_))));
        assert!(matches!(detect_kind(Path::new("README")), Err(Error::UnsupportedMedia(_))));
    }

    #[test]
    fn test_large_photo_is_downscaled() {
        let out = compress_image(&png(400, 200), 100, 80).unwrap();
        assert_eq!((out.width, out.height), (100, 50));

        let decoded = image::load_from_memory_with_format(&out.jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn test_small_photo_keeps_size() {
        let out = compress_image(&png(64, 48), 2048, 80).unwrap();
        assert_eq!((out.width, out.height), (64, 48));
    }

    #[test]
    fn test_garbage_is_image_error() {
        assert!(matches!(compress_image(b"not an image", 100, 80), Err(Error::Image(_))));
    }
}
