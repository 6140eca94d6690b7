//! Pure Rust transform backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Load | `image::ImageReader` with format guessing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Fit | fill-resize + anchored `crop_imm` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → AVIF | `AvifEncoder` (rav1e, speed 6) |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//! | Encode → PNG, GIF, BMP, TIFF | `DynamicImage::write_to` |
//! | Atomic save | `tempfile::NamedTempFile::persist` |
//!
//! Quality only affects the lossy encoders (JPEG, AVIF).

use super::backend::{BackendError, TransformBackend};
use super::calculations::{anchor_offset, crop_window, fill_dimensions, fit_box, resize_dimensions};
use super::params::{ConvertOptions, Quality, ResizeOptions};
use crate::format::OutputFormat;
use crate::params::Method;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, ImageResult, Rgb,
    RgbImage, Rgba,
};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A decoded image plus the encoding settings `save` will use.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub image: DynamicImage,
    /// Output format chosen by `convert`. `None` means "same as the
    /// destination's extension".
    pub format: Option<OutputFormat>,
    /// Format sniffed from the source bytes, used when the destination has
    /// no recognizable extension.
    pub source_format: Option<OutputFormat>,
    pub quality: u8,
}

impl ImageHandle {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-step mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite transparent pixels onto an opaque background colour.
fn flatten(image: &DynamicImage, background: [u8; 3]) -> DynamicImage {
    let rgba = image.to_rgba8();
    let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let a = a as u32;
        let blend = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a)) / 255) as u8;
        Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    });
    DynamicImage::ImageRgb8(flat)
}

fn encode<W: Write + Seek>(
    image: &DynamicImage,
    format: OutputFormat,
    quality: u8,
    writer: &mut W,
) -> ImageResult<()> {
    match format {
        OutputFormat::Jpeg => {
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(writer, quality).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Avif => {
            let rgba = image.to_rgba8();
            AvifEncoder::new_with_speed_quality(writer, 6, quality).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )
        }
        OutputFormat::Webp => {
            let rgba = image.to_rgba8();
            WebPEncoder::new_lossless(writer).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )
        }
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(writer, ImageFormat::Gif)
        }
        OutputFormat::Bmp => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(writer, ImageFormat::Bmp)
        }
        OutputFormat::Png => image.write_to(writer, ImageFormat::Png),
        OutputFormat::Tiff => image.write_to(writer, ImageFormat::Tiff),
    }
}

impl TransformBackend for RustBackend {
    type Handle = ImageHandle;

    fn load(&self, path: &Path) -> Result<ImageHandle, BackendError> {
        let load_err = |reason: String| BackendError::Load {
            path: path.display().to_string(),
            reason,
        };
        let reader = ImageReader::open(path)
            .map_err(|e| load_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| load_err(e.to_string()))?;
        let source_format = reader
            .format()
            .and_then(|f| OutputFormat::from_alias(f.to_mime_type()));
        let image = reader.decode().map_err(|e| load_err(e.to_string()))?;
        Ok(ImageHandle {
            image,
            format: None,
            source_format,
            quality: Quality::default().value() as u8,
        })
    }

    fn apply_quality(&self, handle: &mut ImageHandle, quality: u32) -> Result<(), BackendError> {
        if !(1..=100).contains(&quality) {
            return Err(BackendError::Quality(quality));
        }
        handle.quality = quality as u8;
        Ok(())
    }

    fn resize(
        &self,
        handle: &mut ImageHandle,
        method: Method,
        width: u32,
        height: u32,
        options: &ResizeOptions,
    ) -> Result<(), BackendError> {
        let source = handle.dimensions();
        let image = &handle.image;

        let result = match method {
            Method::Resize => {
                let (w, h) = resize_dimensions(source, (width, height), options.allow_enlarge);
                ((w, h) != source).then(|| image.resize_exact(w, h, FilterType::Lanczos3))
            }
            Method::Fit => {
                let target = fit_box(source, (width, height), options.allow_enlarge);
                (target != source).then(|| {
                    let (fw, fh) = fill_dimensions(source, target);
                    let (x, y) = anchor_offset((fw, fh), target, options.position);
                    image
                        .resize_exact(fw, fh, FilterType::Lanczos3)
                        .crop_imm(x, y, target.0, target.1)
                })
            }
            Method::Crop => {
                let (x, y, w, h) =
                    crop_window(source, (width, height), options.offset(), options.position);
                ((w, h) != source).then(|| image.crop_imm(x, y, w, h))
            }
        };

        if let Some(image) = result {
            debug!(
                method = %method,
                from = ?source,
                to = ?(image.width(), image.height()),
                "resized"
            );
            handle.image = image;
        }
        Ok(())
    }

    fn convert(
        &self,
        handle: &mut ImageHandle,
        format: &str,
        quality: u32,
        options: &ConvertOptions,
    ) -> Result<(), BackendError> {
        let target = OutputFormat::from_alias(format)
            .ok_or_else(|| BackendError::Format(format.to_string()))?;
        self.apply_quality(handle, quality)?;

        if !target.supports_alpha() && handle.image.color().has_alpha() {
            handle.image = match options.background {
                Some(bg) => flatten(&handle.image, bg),
                None => DynamicImage::ImageRgb8(handle.image.to_rgb8()),
            };
        }
        handle.format = Some(target);
        Ok(())
    }

    fn save(&self, handle: &ImageHandle, destination: &Path) -> Result<(), BackendError> {
        let save_err = |reason: String| BackendError::Save {
            path: destination.display().to_string(),
            reason,
        };
        let format = handle
            .format
            .or_else(|| {
                destination
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(OutputFormat::from_alias)
            })
            .or(handle.source_format)
            .ok_or_else(|| BackendError::Format(destination.display().to_string()))?;

        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| save_err(e.to_string()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            encode(&handle.image, format, handle.quality, &mut writer)
                .map_err(|e| save_err(e.to_string()))?;
            writer.flush().map_err(|e| save_err(e.to_string()))?;
        }
        tmp.persist(destination)
            .map_err(|e| save_err(e.error.to_string()))?;
        Ok(())
    }
}
