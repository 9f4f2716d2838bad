//! Producers of decoded images.
//!
use std::path::Path;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use crate::{
    error::{DecodeError, SourceError},
    fetch::Fetcher,
};

/// Formats accepted for uploaded files.
const UPLOAD_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

/// File extensions accepted for uploaded files.
const UPLOAD_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Where an image to classify comes from.
#[derive(Debug)]
pub enum ImageSource {
    /// File selected by the user.
    Upload {
        bytes: Bytes,
        filename: Option<String>,
    },
    /// Frame captured by a camera.
    Camera(Bytes),
    /// Address of a remote image.
    Url(String),
}

impl ImageSource {
    /// Short name of the origin for logging.
    pub fn origin(&self) -> &'static str {
        match self {
            ImageSource::Upload { .. } => "upload",
            ImageSource::Camera(_) => "camera",
            ImageSource::Url(_) => "url",
        }
    }

    /// Produce the decoded image.
    pub async fn load(self, fetcher: &Fetcher) -> Result<DynamicImage, SourceError> {
        let image = match self {
            ImageSource::Upload { bytes, filename } => {
                decode_upload(&bytes, filename.as_deref())?
            }
            ImageSource::Camera(bytes) => decode(&bytes)?,
            ImageSource::Url(url) => {
                let bytes = fetcher.fetch(&url).await?;
                decode(&bytes)?
            }
        };

        Ok(image)
    }
}

/// Decode bytes of any format the decoder can sniff.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let image = image::load_from_memory(bytes)?;
    log::debug!(
        "Decoded {}x{} image ({:?})",
        image.width(),
        image.height(),
        image.color()
    );

    Ok(image)
}

/// Decode an uploaded file, restricted to the accepted upload formats.
pub fn decode_upload(bytes: &[u8], filename: Option<&str>) -> Result<DynamicImage, DecodeError> {
    if let Some(filename) = filename {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
            return Err(DecodeError::UnsupportedFormat(filename.to_owned()));
        }
    }

    let format = image::guess_format(bytes)?;
    if !UPLOAD_FORMATS.contains(&format) {
        return Err(DecodeError::UnsupportedFormat(format!("{format:?}")));
    }

    let image = image::load_from_memory_with_format(bytes, format)?;

    Ok(image)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use image::{ImageOutputFormat, Rgb, RgbImage};

    use super::*;

    fn encoded(format: ImageOutputFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 3, Rgb([10, 20, 30])));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_upload_formats() -> Result<(), DecodeError> {
        let png = encoded(ImageOutputFormat::Png);
        let image = decode_upload(&png, Some("photo.PNG"))?;
        assert_eq!((image.width(), image.height()), (5, 3));

        let bmp = encoded(ImageOutputFormat::Bmp);
        assert!(decode_upload(&bmp, Some("photo.bmp")).is_ok());

        let jpg = encoded(ImageOutputFormat::Jpeg(90));
        assert!(decode_upload(&jpg, Some("photo.jpeg")).is_ok());
        assert!(decode_upload(&jpg, None).is_ok());

        Ok(())
    }

    #[test]
    fn test_upload_with_wrong_extension() {
        let png = encoded(ImageOutputFormat::Png);
        assert!(matches!(
            decode_upload(&png, Some("photo.txt")),
            Err(DecodeError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode_upload(&png, Some("photo")),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_upload_with_unsupported_format() {
        let gif = b"GIF89a\x05\x00\x03\x00\x80\x00\x00";
        assert!(matches!(
            decode_upload(gif, None),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_garbage_bytes() {
        assert!(matches!(
            decode(b"<html><body>not an image</body></html>"),
            Err(DecodeError::Image(_))
        ));
        assert!(matches!(
            decode_upload(b"\x89PNG\r\n\x1a\ntruncated", Some("a.png")),
            Err(DecodeError::Image(_))
        ));
    }

    #[tokio::test]
    async fn test_camera_frames_are_sniffed() -> Result<(), Box<dyn std::error::Error>> {
        let fetcher = Fetcher::new(crate::fetch::DEFAULT_FETCH_TIMEOUT)?;
        let source = ImageSource::Camera(Bytes::from(encoded(ImageOutputFormat::Jpeg(80))));
        assert_eq!(source.origin(), "camera");

        let image = source.load(&fetcher).await?;
        assert_eq!((image.width(), image.height()), (5, 3));

        Ok(())
    }
}
