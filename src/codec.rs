//! Image <-> PNG/base64 conversion.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::StylizerError;

/// Encodes `image` as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, StylizerError> {
    let mut output = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|err| StylizerError::UnsupportedFormat(err.to_string()))?;
    Ok(output)
}

/// Encodes `image` as PNG then standard base64, the form both providers take.
pub fn encode_base64_png(image: &DynamicImage) -> Result<String, StylizerError> {
    Ok(general_purpose::STANDARD.encode(encode_png(image)?))
}

/// Decodes any supported container (PNG, JPEG) from raw bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, StylizerError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| StylizerError::UnsupportedFormat(err.to_string()))?;
    if reader.format().is_none() {
        debug!("Could not guess image format from {} bytes", bytes.len());
        return Err(StylizerError::UnsupportedFormat(
            "unrecognised image container".to_string(),
        ));
    }
    reader.decode().map_err(|err| {
        debug!("Failed to decode image: {}", err);
        StylizerError::UnsupportedFormat(err.to_string())
    })
}

/// Base64-decodes `text` and then decodes the image inside it.
pub fn decode_base64(text: &str) -> Result<DynamicImage, StylizerError> {
    let bytes = general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|err| StylizerError::UnsupportedFormat(format!("invalid base64: {err}")))?;
    decode(&bytes)
}

/// Writes `image` to `path` as a PNG file.
pub fn write_png(image: &DynamicImage, path: &Path) -> Result<(), StylizerError> {
    let bytes = encode_png(image)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_image() -> DynamicImage {
    let mut img = image::RgbaImage::new(4, 3);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = image::Rgba([(x * 60) as u8, (y * 80) as u8, 200, 255 - (x as u8)]);
    }
    DynamicImage::ImageRgba8(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_png_round_trip_is_pixel_identical() {
        let original = sample_image();
        let encoded = encode_base64_png(&original).expect("encode");
        let decoded = decode_base64(&encoded).expect("decode");
        assert_eq!(decoded.to_rgba8(), original.to_rgba8());
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn jpeg_input_decodes() {
        let rgb = DynamicImage::ImageRgb8(sample_image().to_rgb8());
        let mut jpeg = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .expect("encode jpeg");
        let decoded = decode(&jpeg).expect("decode jpeg");
        assert_eq!(decoded.width(), 4);
    }

    #[test]
    fn garbage_is_unsupported() {
        assert!(matches!(
            decode(b"This is not an image."),
            Err(StylizerError::UnsupportedFormat(_))
        ));
        assert!(matches!(decode(&[]), Err(StylizerError::UnsupportedFormat(_))));
        // PNG magic with a truncated body
        assert!(matches!(
            decode(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Err(StylizerError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode_base64("@@not base64@@"),
            Err(StylizerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn write_png_creates_readable_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.png");
        write_png(&sample_image(), &path).expect("write");
        let bytes = std::fs::read(&path).expect("read back");
        assert_eq!(image::guess_format(&bytes).ok(), Some(ImageFormat::Png));
    }
}
