//! Text rasterization on top of `fontdue`.
//!
//! Font discovery degrades rather than fails: a missing or unreadable font
//! yields a disabled renderer that draws nothing, the same policy the audio
//! path follows. Pixel output is not part of the testable contract, so tests
//! run with [`TextRenderer::disabled`].

use std::path::{Path, PathBuf};

use crate::{color::Rgba8, surface::Surface};

/// Candidate font files probed when no explicit font is configured.
const FONT_PROBE_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

pub struct TextRenderer {
    font: Option<fontdue::Font>,
}

impl TextRenderer {
    /// Load a font from `source`, or probe the system locations when `None`.
    /// Never fails; logs and disables text on any miss.
    pub fn load(source: Option<&Path>) -> Self {
        let candidates: Vec<PathBuf> = match source {
            Some(path) => vec![path.to_path_buf()],
            None => FONT_PROBE_PATHS.iter().map(PathBuf::from).collect(),
        };

        for path in &candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            match fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()) {
                Ok(font) => {
                    tracing::debug!(path = %path.display(), "loaded text font");
                    return Self { font: Some(font) };
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "font file did not parse"
                    );
                }
            }
        }

        tracing::warn!("no usable font found, text will not be rendered");
        Self { font: None }
    }

    /// A renderer that draws nothing. Keeps rendering tests hermetic.
    pub fn disabled() -> Self {
        Self { font: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.font.is_some()
    }

    /// Advance width of `text` at `px` size. Zero when disabled.
    pub fn measure(&self, text: &str, px: f32) -> f64 {
        let Some(font) = &self.font else {
            return 0.0;
        };
        text.chars()
            .filter(|&c| font.lookup_glyph_index(c) != 0)
            .map(|c| f64::from(font.metrics(c, px).advance_width))
            .sum()
    }

    /// Draw `text` with its baseline at `y`. Characters the font has no glyph
    /// for (typically emoji) are skipped.
    pub fn draw(
        &self,
        surface: &mut Surface,
        text: &str,
        x: f64,
        y: f64,
        px: f32,
        color: Rgba8,
        align: Align,
    ) {
        let Some(font) = &self.font else {
            return;
        };

        let mut pen_x = match align {
            Align::Left => x,
            Align::Center => x - self.measure(text, px) / 2.0,
            Align::Right => x - self.measure(text, px),
        };

        for c in text.chars() {
            if font.lookup_glyph_index(c) == 0 {
                continue;
            }
            let (metrics, coverage) = font.rasterize(c, px);
            let glyph_left = pen_x + f64::from(metrics.xmin);
            let glyph_top = y - f64::from(metrics.height as i32 + metrics.ymin);

            for (i, &cov) in coverage.iter().enumerate() {
                if cov == 0 {
                    continue;
                }
                let gx = (i % metrics.width) as i64;
                let gy = (i / metrics.width) as i64;
                let alpha = u16::from(cov) * u16::from(color.a) / 255;
                surface.blend_pixel(
                    glyph_left as i64 + gx,
                    glyph_top as i64 + gy,
                    Rgba8::rgba(color.r, color.g, color.b, alpha as u8),
                );
            }

            pen_x += f64::from(metrics.advance_width);
        }
    }
}
