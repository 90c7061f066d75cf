//! TrueType text drawing onto tiny-skia pixmaps.
//!
//! The font is loaded at runtime from a file; frames render without text
//! when no font is configured.

use std::path::Path;

use climate_common::{ViewerError, ViewerResult};
use rusttype::{point, Font, Scale};
use tiny_skia::Pixmap;

use crate::color::Rgb;

/// A loaded font able to measure and draw single-line strings.
#[derive(Clone)]
pub struct TextRenderer {
    font: Font<'static>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl TextRenderer {
    pub fn load(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ViewerError::InvalidConfig(format!("cannot read font {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> ViewerResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| ViewerError::InvalidConfig("invalid TrueType font data".to_string()))?;
        Ok(Self { font })
    }

    /// Width and height in pixels of `text` at `size` px.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        let scale = Scale::uniform(size);
        let v = self.font.v_metrics(scale);
        let height = v.ascent - v.descent;
        let width = self
            .font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        (width, height)
    }

    /// Draw `text` with its top-left corner at (x, y).
    pub fn draw(&self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32, size: f32, color: Rgb) {
        let scale = Scale::uniform(size);
        let ascent = self.font.v_metrics(scale).ascent;
        let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
        let data = pixmap.data_mut();

        for glyph in self.font.layout(text, scale, point(x, y + ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let offset = (py as usize * width as usize + px as usize) * 4;
                blend_over(&mut data[offset..offset + 4], color, coverage);
            });
        }
    }

    /// Draw `text` with a one-pixel halo behind it for legibility over the raster.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_with_halo(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        color: Rgb,
        halo: Rgb,
    ) {
        for (dx, dy) in [(-1.0, 0.0), (1.0, 0.0), (0.0, -1.0), (0.0, 1.0)] {
            self.draw(pixmap, text, x + dx, y + dy, size, halo);
        }
        self.draw(pixmap, text, x, y, size, color);
    }
}

/// Source-over of an opaque color at `coverage` onto one premultiplied pixel.
#[inline]
fn blend_over(dst: &mut [u8], color: Rgb, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let inv = 1.0 - a;
    let mix = |src: u8, d: u8| (src as f32 * a + d as f32 * inv).round().min(255.0) as u8;
    dst[0] = mix(color.r, dst[0]);
    dst[1] = mix(color.g, dst[1]);
    dst[2] = mix(color.b, dst[2]);
    dst[3] = mix(255, dst[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_bytes() {
        assert!(TextRenderer::from_bytes(vec![0u8; 16]).is_err());
    }

    #[test]
    fn test_missing_font_file() {
        let err = TextRenderer::load("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig(_)));
    }

    #[test]
    fn test_blend_over_full_coverage() {
        let mut px = [10u8, 20, 30, 255];
        blend_over(&mut px, Rgb::new(200, 100, 0), 1.0);
        assert_eq!(px, [200, 100, 0, 255]);
    }

    #[test]
    fn test_blend_over_keeps_premultiplied_invariant() {
        let mut px = [0u8, 0, 0, 0];
        blend_over(&mut px, Rgb::new(255, 255, 255), 0.5);
        assert_eq!(px[3], 128);
        assert!(px[0] <= px[3]);
    }
}
