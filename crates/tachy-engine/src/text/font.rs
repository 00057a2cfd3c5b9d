use std::fmt;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

use crate::error::{Result, TachyError};
use crate::paint::Color;
use crate::texture::{PixelBuffer, PixelFormat};

/// Parsed TrueType or OpenType font.
pub struct Font {
    inner: fontdue::Font,
}

impl Font {
    /// Fails with `InvalidFont` when `bytes` is not a font `fontdue` can read.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map(|inner| Self { inner })
            .map_err(|e| TachyError::InvalidFont(e.to_string()))
    }

    /// Renders `text` on a single line at `size_px` pixels per em.
    ///
    /// The image spans the laid-out advance width and the line height. Ink
    /// pixels carry `color` with alpha scaled by glyph coverage; the rest is
    /// fully transparent. Empty text yields a one pixel wide image.
    pub fn render(&self, text: &str, size_px: f32, color: impl Into<Color>) -> Result<PixelBuffer> {
        if !(size_px.is_finite() && size_px > 0.0) {
            return Err(TachyError::InvalidConfig(format!(
                "font size must be positive, got {size_px}"
            )));
        }

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.inner], &TextStyle::new(text, size_px, 0));
        let glyphs = layout.glyphs();

        let width = glyphs
            .iter()
            .map(|g| {
                let m = self.inner.metrics_indexed(g.key.glyph_index, size_px);
                g.x - m.xmin as f32 + m.advance_width
            })
            .fold(1.0f32, f32::max)
            .ceil() as usize;
        let height = glyphs
            .iter()
            .map(|g| g.y + g.height as f32)
            .fold(layout.height(), f32::max)
            .ceil()
            .max(1.0) as usize;

        let mut coverage = vec![0u8; width * height];
        for g in glyphs.iter().filter(|g| g.char_data.rasterize() && g.width > 0) {
            let (metrics, bitmap) = self.inner.rasterize_config(g.key);
            blit_coverage(
                &mut coverage,
                width,
                &bitmap,
                metrics.width,
                g.x.round() as i64,
                g.y.round() as i64,
            );
        }

        log::debug!("rendered {:?} at {size_px}px into {width}x{height}", text);
        colorize_coverage(&coverage, width, color.into())
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font").finish_non_exhaustive()
    }
}

/// Copies a row-major coverage bitmap into `canvas` with its top-left at
/// `(x, y)`. Overlapping ink keeps the larger coverage; pixels outside the
/// canvas are dropped.
pub fn blit_coverage(
    canvas: &mut [u8],
    canvas_width: usize,
    glyph: &[u8],
    glyph_width: usize,
    x: i64,
    y: i64,
) {
    if canvas_width == 0 || glyph_width == 0 {
        return;
    }
    let canvas_height = canvas.len() / canvas_width;

    for (row, src) in glyph.chunks_exact(glyph_width).enumerate() {
        let Ok(cy) = usize::try_from(y + row as i64) else { continue };
        if cy >= canvas_height {
            break;
        }
        for (col, &value) in src.iter().enumerate() {
            let Ok(cx) = usize::try_from(x + col as i64) else { continue };
            if cx >= canvas_width {
                break;
            }
            let dst = &mut canvas[cy * canvas_width + cx];
            *dst = (*dst).max(value);
        }
    }
}

/// Turns a coverage mask `width` pixels wide into straight-alpha RGBA,
/// with alpha = coverage × `color.a`.
pub fn colorize_coverage(coverage: &[u8], width: usize, color: Color) -> Result<PixelBuffer> {
    let [r, g, b, a] = color.to_rgba_u8();
    let height = if width == 0 { 0 } else { coverage.len() / width };
    let data = coverage
        .iter()
        .flat_map(|&c| [r, g, b, ((u16::from(c) * u16::from(a) + 127) / 255) as u8])
        .collect();
    PixelBuffer::with_format(width as u32, height as u32, PixelFormat::Rgba8, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn garbage_bytes_are_not_a_font() {
        assert!(matches!(Font::from_bytes(b"not a font"), Err(TachyError::InvalidFont(_))));
        assert!(matches!(Font::from_bytes(&[]), Err(TachyError::InvalidFont(_))));
    }

    // ── coverage ──────────────────────────────────────────────────────────

    #[test]
    fn blit_clips_at_canvas_edges() {
        let mut canvas = vec![0u8; 3 * 2];
        blit_coverage(&mut canvas, 3, &[10, 20, 30, 40], 2, 2, 1);
        assert_eq!(canvas, vec![0, 0, 0, 0, 0, 10]);

        let mut canvas = vec![0u8; 3 * 2];
        blit_coverage(&mut canvas, 3, &[10, 20, 30, 40], 2, -1, -1);
        assert_eq!(canvas, vec![40, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn overlapping_glyphs_keep_the_stronger_ink() {
        let mut canvas = vec![0u8; 4];
        blit_coverage(&mut canvas, 4, &[200, 50], 2, 0, 0);
        blit_coverage(&mut canvas, 4, &[100, 100], 2, 1, 0);
        assert_eq!(canvas, vec![200, 100, 100, 0]);
    }

    #[test]
    fn colorize_scales_alpha_by_coverage() {
        let image = colorize_coverage(&[0, 255, 128, 255], 2, Color::rgba(1.0, 0.0, 0.0, 0.5)).unwrap();
        assert_eq!((image.width(), image.height()), (2, 2));
        assert_eq!(image.pixel(0, 0), Some(&[255, 0, 0, 0][..]));
        assert_eq!(image.pixel(1, 0), Some(&[255, 0, 0, 128][..]));
        assert_eq!(image.pixel(0, 1), Some(&[255, 0, 0, 64][..]));
    }

    // ── rendering ─────────────────────────────────────────────────────────

    #[test]
    fn renders_ink_inside_the_line_box() {
        let Ok(bytes) = std::fs::read(SYSTEM_FONT) else { return };
        let font = Font::from_bytes(&bytes).unwrap();

        let image = font.render("Ag", 32.0, Color::BLACK).unwrap();
        assert_eq!(image.format(), PixelFormat::Rgba8);
        assert!(image.width() > 16 && image.height() >= 32);
        let alphas: Vec<u8> = image.data().chunks_exact(4).map(|p| p[3]).collect();
        assert!(alphas.iter().any(|&a| a == 255));
        assert!(alphas.iter().any(|&a| a == 0));

        let wider = font.render("Agggg", 32.0, Color::BLACK).unwrap();
        assert!(wider.width() > image.width());
        assert!(matches!(font.render("Ag", 0.0, Color::BLACK), Err(TachyError::InvalidConfig(_))));
    }
}
