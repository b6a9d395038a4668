//! Image preprocessing for classifier input
//!
//! Mirrors the preprocessing the classifiers are trained with: RGB
//! conversion, an exact (non aspect preserving) resize and scaling of pixel
//! values to `[0, 1]`, stacked into a single-sample batch.

use crate::{
    config::{TensorLayout, TARGET_SIZE},
    error::{ClassifyError, Result},
};
use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;
use std::path::Path;

/// Configuration for preprocessing behavior
#[derive(Debug, Clone, Copy)]
pub struct PreprocessingOptions {
    /// Side length of the square model input
    pub target_size: u32,
    /// Tensor memory layout expected by the model
    pub layout: TensorLayout,
    /// Resampling filter used for the resize
    pub filter: FilterType,
}

impl Default for PreprocessingOptions {
    fn default() -> Self {
        Self {
            target_size: TARGET_SIZE,
            layout: TensorLayout::Nhwc,
            // Bicubic, the default of common Python imaging stacks
            filter: FilterType::CatmullRom,
        }
    }
}

/// Image preprocessing utilities
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Decode an image file
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path = path.as_ref();
        let reader = image::ImageReader::open(path)
            .map_err(|e| ClassifyError::file_io_error("open image", path, e))?
            .with_guessed_format()
            .map_err(|e| ClassifyError::file_io_error("read image", path, e))?;
        reader
            .decode()
            .map_err(|e| ClassifyError::image_load_error(path, e))
    }

    /// Convert to RGB unless the image already is 8-bit RGB
    ///
    /// Alpha and single-channel data are dropped by the conversion.
    #[must_use]
    pub fn to_rgb(image: &DynamicImage) -> RgbImage {
        match image {
            DynamicImage::ImageRgb8(rgb) => rgb.clone(),
            other => {
                tracing::debug!(color = ?other.color(), "Converting image to RGB");
                other.to_rgb8()
            },
        }
    }

    /// Preprocess an image into a normalized single-sample batch
    pub fn preprocess(image: &DynamicImage, options: &PreprocessingOptions) -> Result<Array4<f32>> {
        if options.target_size == 0 {
            return Err(ClassifyError::processing("Target size must be greater than zero"));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifyError::processing(format!(
                "Cannot preprocess an empty image ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let span = tracing::debug_span!(
            "preprocessing",
            original_width = image.width(),
            original_height = image.height(),
            target_size = options.target_size
        );
        let _guard = span.enter();

        let rgb = Self::to_rgb(image);
        let resized = image::imageops::resize(
            &rgb,
            options.target_size,
            options.target_size,
            options.filter,
        );

        Ok(Self::to_tensor(&resized, options.layout))
    }

    /// Convert an RGB buffer to a `[0, 1]` tensor with a leading batch axis
    fn to_tensor(rgb: &RgbImage, layout: TensorLayout) -> Array4<f32> {
        let (width, height) = rgb.dimensions();
        let (w, h) = (width as usize, height as usize);

        match layout {
            TensorLayout::Nhwc => Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
                f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0
            }),
            TensorLayout::Nchw => Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
                f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0
            }),
        }
    }
}
