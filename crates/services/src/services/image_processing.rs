//! Display and thumbnail renditions for uploaded images.

use std::{io::Cursor, sync::Arc};

use image::{DynamicImage, ImageError, codecs::jpeg::JpegEncoder, imageops::FilterType};
use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};

#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("could not decode image: {0}")]
    Decode(#[source] ImageError),
    #[error("could not encode rendition: {0}")]
    Encode(#[source] ImageError),
    #[error("image worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// Target box and JPEG quality of one rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenditionSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

pub const DISPLAY: RenditionSpec = RenditionSpec {
    width: 1200,
    height: 800,
    quality: 85,
};

pub const THUMBNAIL: RenditionSpec = RenditionSpec {
    width: 400,
    height: 300,
    quality: 80,
};

pub const RENDITION_CONTENT_TYPE: &str = "image/jpeg";
pub const RENDITION_EXTENSION: &str = "jpg";

#[derive(Debug, Clone)]
pub struct Renditions {
    pub display: Vec<u8>,
    pub thumbnail: Vec<u8>,
}

/// Decodes once, then encodes both renditions concurrently on the blocking
/// pool. Either failing fails the whole call.
pub async fn create_renditions(bytes: Vec<u8>) -> Result<Renditions, ImageProcessingError> {
    let source = spawn_blocking(move || image::load_from_memory(&bytes))
        .await?
        .map_err(ImageProcessingError::Decode)?;
    let source = Arc::new(source);

    let display_src = Arc::clone(&source);
    let thumb_src = source;
    let (display, thumbnail) = tokio::try_join!(
        spawn_blocking(move || render(&display_src, DISPLAY)),
        spawn_blocking(move || render(&thumb_src, THUMBNAIL)),
    )?;

    Ok(Renditions {
        display: display?,
        thumbnail: thumbnail?,
    })
}

/// Cover-fit into the target box (centered crop), re-encoded as JPEG.
pub fn render(source: &DynamicImage, spec: RenditionSpec) -> Result<Vec<u8>, ImageProcessingError> {
    let fitted = source
        .resize_to_fill(spec.width, spec.height, FilterType::Lanczos3)
        .to_rgb8();

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, spec.quality);
    fitted
        .write_with_encoder(encoder)
        .map_err(ImageProcessingError::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    /// PNG bytes of a `width` x `height` gradient.
    pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn renditions_have_exact_dimensions() {
        let renditions = create_renditions(sample_png(640, 640)).await.unwrap();

        let display = image::load_from_memory(&renditions.display).unwrap();
        assert_eq!((display.width(), display.height()), (1200, 800));
        let thumb = image::load_from_memory(&renditions.thumbnail).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (400, 300));
        assert_eq!(
            image::guess_format(&renditions.display).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn corrupt_bytes_fail_to_decode() {
        let err = create_renditions(b"definitely not an image".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ImageProcessingError::Decode(_)));
    }
}
