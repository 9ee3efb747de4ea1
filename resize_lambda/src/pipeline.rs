//! Decode, downscale and re-encode a single image.
//!
//! Everything here is synchronous and CPU-bound. Callers on the async runtime
//! go through `tokio::task::spawn_blocking`.

use std::borrow::Cow;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use lambda_runtime::tracing;

use crate::config::{Config, OutputFormat};
use crate::error::TransformError;

#[derive(Debug)]
pub(crate) struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ImagePipeline {
    max_dimension: u32,
    format: OutputFormat,
    quality: u8,
}

impl ImagePipeline {
    pub(crate) fn new(max_dimension: u32, format: OutputFormat, quality: u8) -> Self {
        Self {
            max_dimension,
            format,
            quality,
        }
    }

    pub(crate) fn from_config(config: &Config) -> Self {
        Self::new(config.max_dimension, config.output_format, config.quality)
    }

    /// Shrinks `decoded` to fit the bounding box and encodes it in the
    /// configured format.
    pub(crate) fn resize_and_encode(
        &self,
        decoded: DynamicImage,
    ) -> Result<EncodedImage, TransformError> {
        let (width, height) = decoded.dimensions();
        let (target_width, target_height) = fit_within(width, height, self.max_dimension);

        let resized = if (target_width, target_height) == (width, height) {
            tracing::debug!(width, height, "image already within bounds");
            decoded
        } else {
            decoded.resize_exact(target_width, target_height, FilterType::Lanczos3)
        };

        let bytes = match self.format {
            OutputFormat::Webp => encode_webp(&resized, self.quality)?,
            OutputFormat::Jpeg => encode_jpeg(&resized, self.quality)?,
        };
        tracing::debug!(
            original_width = width,
            original_height = height,
            width = target_width,
            height = target_height,
            size = bytes.len(),
            "image re-encoded"
        );

        Ok(EncodedImage {
            bytes,
            width: target_width,
            height: target_height,
        })
    }
}

/// Decodes with whichever built-in codec matches the payload.
pub(crate) fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Largest size with the same aspect ratio that fits in `max` x `max`.
/// Images already inside the box are returned unchanged.
pub(crate) fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    if width >= height {
        let scaled = (f64::from(height) * f64::from(max) / f64::from(width)).round() as u32;
        (max, scaled.max(1))
    } else {
        let scaled = (f64::from(width) * f64::from(max) / f64::from(height)).round() as u32;
        (scaled.max(1), max)
    }
}

fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, TransformError> {
    // libwebp only takes 8-bit RGB or RGBA input.
    let image = match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
        other if other.color().has_alpha() => {
            Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
        }
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    };
    let encoder = webp::Encoder::from_image(&image).map_err(|message| TransformError::Encode {
        format: "webp",
        message: message.to_string(),
    })?;
    let memory = encoder
        .encode_simple(false, f32::from(quality))
        .map_err(|e| TransformError::Encode {
            format: "webp",
            message: format!("{e:?}"),
        })?;
    Ok(memory.to_vec())
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, TransformError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut bytes = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
        .map_err(|e| TransformError::Encode {
            format: "jpeg",
            message: e.to_string(),
        })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode, png_bytes, rgba_image};
    use image::ImageFormat;

    fn render(pipeline: &ImagePipeline, bytes: &[u8]) -> EncodedImage {
        pipeline.resize_and_encode(decode(bytes).unwrap()).unwrap()
    }

    #[test]
    fn fit_within_landscape() {
        assert_eq!(fit_within(2000, 1000, 800), (800, 400));
        assert_eq!(fit_within(1200, 801, 800), (800, 534));
    }

    #[test]
    fn fit_within_portrait() {
        assert_eq!(fit_within(1000, 3000, 800), (267, 800));
    }

    #[test]
    fn fit_within_square() {
        assert_eq!(fit_within(1000, 1000, 800), (800, 800));
    }

    #[test]
    fn fit_within_never_upscales() {
        assert_eq!(fit_within(640, 480, 800), (640, 480));
        assert_eq!(fit_within(800, 800, 800), (800, 800));
        assert_eq!(fit_within(1, 1, 800), (1, 1));
    }

    #[test]
    fn fit_within_keeps_at_least_one_pixel() {
        assert_eq!(fit_within(10_000, 1, 800), (800, 1));
        assert_eq!(fit_within(1, 10_000, 800), (1, 800));
    }

    #[test]
    fn renders_webp_within_bounds() {
        let pipeline = ImagePipeline::new(800, OutputFormat::Webp, 80);
        let output = render(&pipeline, &png_bytes(1600, 900));

        assert_eq!((output.width, output.height), (800, 450));
        assert_eq!(
            image::guess_format(&output.bytes).unwrap(),
            ImageFormat::WebP
        );
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (800, 450));
    }

    #[test]
    fn small_images_keep_their_size() {
        let pipeline = ImagePipeline::new(800, OutputFormat::Webp, 80);
        let output = render(&pipeline, &png_bytes(320, 200));
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (320, 200));
    }

    #[test]
    fn encodes_images_with_alpha() {
        let pipeline = ImagePipeline::new(100, OutputFormat::Webp, 80);
        let output = render(&pipeline, &encode(&rgba_image(300, 150), ImageFormat::Png));
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn renders_jpeg_and_drops_alpha() {
        let pipeline = ImagePipeline::new(64, OutputFormat::Jpeg, 70);
        let output = render(&pipeline, &encode(&rgba_image(128, 256), ImageFormat::Png));

        assert_eq!(image::guess_format(&output.bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (32, 64));
    }

    #[test]
    fn accepts_any_builtin_input_codec() {
        let pipeline = ImagePipeline::new(50, OutputFormat::Webp, 80);
        let bmp = encode(&crate::test_support::rgb_image(100, 100), ImageFormat::Bmp);
        let output = render(&pipeline, &bmp);
        assert_eq!((output.width, output.height), (50, 50));
    }

    #[test]
    fn encoding_is_deterministic() {
        let pipeline = ImagePipeline::new(200, OutputFormat::Webp, 80);
        let input = png_bytes(640, 480);
        assert_eq!(render(&pipeline, &input).bytes, render(&pipeline, &input).bytes);
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode(b"just some text, not an image").is_err());
    }
}
