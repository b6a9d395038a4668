//! Image sources for dataset collection
//!
//! `ImageSource` is the seam for real image retrieval. The only shipped
//! implementation fabricates solid-colour placeholders with the label drawn
//! on top, so callers that expect files to appear keep working.

use crate::config::TARGET_SIZE;
use crate::error::{ClassifyError, Result};
use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

/// Environment variable naming a TrueType font that replaces the bundled one
pub const FONT_ENV_VAR: &str = "LABELVISION_FONT";

/// DejaVu Sans Mono, see `assets/fonts/LICENSE-DejaVu.txt`
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

const TEXT_ORIGIN: (i32, i32) = (10, 100);
const TEXT_SCALE: f32 = 14.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Provider of images for a label
pub trait ImageSource {
    /// Fetch at most `limit` images for `label`
    ///
    /// # Errors
    /// Any failure to obtain images; the collector reports it per label.
    fn fetch(&mut self, label: &str, limit: usize) -> Result<Vec<DynamicImage>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Fabricates solid-colour placeholder images
pub struct PlaceholderSource {
    rng: StdRng,
    font: Option<FontArc>,
    size: u32,
}

impl std::fmt::Debug for PlaceholderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderSource")
            .field("size", &self.size)
            .field("has_font", &self.font.is_some())
            .finish_non_exhaustive()
    }
}

impl PlaceholderSource {
    /// Random colours from entropy, font from `LABELVISION_FONT` or the bundled one
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            font: env_font().or_else(bundled_font),
            size: TARGET_SIZE,
        }
    }

    /// Reproducible colours with the bundled font
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            font: bundled_font(),
            size: TARGET_SIZE,
        }
    }

    /// Use the given font for the label overlay
    pub fn with_font_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ClassifyError::file_io_error("read font", path, e))?;
        let font = FontArc::try_from_vec(bytes).map_err(|_| {
            ClassifyError::invalid_config(format!("Invalid font file '{}'", path.display()))
        })?;
        self.font = Some(font);
        Ok(self)
    }

    /// Plain solid-colour images
    #[must_use]
    pub fn without_text(mut self) -> Self {
        self.font = None;
        self
    }

    #[must_use]
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn render(&mut self, label: &str, number: usize) -> DynamicImage {
        let color = Rgb([self.rng.gen(), self.rng.gen(), self.rng.gen()]);
        let mut canvas = RgbImage::from_pixel(self.size, self.size, color);

        match &self.font {
            Some(font) => {
                let scale = PxScale::from(TEXT_SCALE);
                let line_height = (TEXT_SCALE * 1.2).round() as i32;
                let (x, y) = TEXT_ORIGIN;
                let lines = [label.to_string(), format!("#{number}")];
                for (i, line) in lines.iter().enumerate() {
                    let offset = line_height * i32::try_from(i).unwrap_or(0);
                    draw_text_mut(&mut canvas, TEXT_COLOR, x, y + offset, scale, font, line);
                }
            },
            None => tracing::trace!(label, "Text overlay disabled"),
        }

        DynamicImage::ImageRgb8(canvas)
    }
}

impl Default for PlaceholderSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for PlaceholderSource {
    fn fetch(&mut self, label: &str, limit: usize) -> Result<Vec<DynamicImage>> {
        Ok((1..=limit).map(|number| self.render(label, number)).collect())
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }
}

fn env_font() -> Option<FontArc> {
    let path = std::env::var_os(FONT_ENV_VAR)?;
    let font = std::fs::read(&path)
        .ok()
        .and_then(|bytes| FontArc::try_from_vec(bytes).ok());
    if font.is_none() {
        tracing::warn!(
            path = %Path::new(&path).display(),
            "Ignoring unreadable {FONT_ENV_VAR}, using the bundled font"
        );
    }
    font
}

fn bundled_font() -> Option<FontArc> {
    FontArc::try_from_slice(BUNDLED_FONT)
        .map_err(|e| tracing::debug!(error = %e, "Bundled font failed to parse"))
        .ok()
}
