use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::path::Path;

pub struct TextOverlay {
    font: Font,
    font_size: f32,
}

impl TextOverlay {
    pub fn from_file(path: &Path, font_size: f32) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        Self::from_bytes(&data, font_size)
    }

    pub fn from_bytes(data: &[u8], font_size: f32) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;
        Ok(Self { font, font_size })
    }

    pub fn line_height(&self) -> u32 {
        self.font_size.ceil() as u32
    }

    /// Composite text onto an RGBA pixel buffer at the given position.
    #[allow(clippy::too_many_arguments)]
    pub fn composite(
        &self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        text: &str,
        x: u32,
        y: u32,
        color: [u8; 4],
    ) {
        let mut cursor_x = x as i32;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
            let glyph_y = y as i32 + self.font_size as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let px = cursor_x + metrics.xmin + gx as i32;
                    let py = glyph_y + gy as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let idx = ((py as u32 * width + px as u32) * 4) as usize;
                    blend(&mut pixels[idx..idx + 4], color, coverage);
                }
            }

            cursor_x += metrics.advance_width.round() as i32;
        }
    }

    pub fn measure_width(&self, text: &str) -> u32 {
        let width: f32 = text
            .chars()
            .map(|ch| self.font.metrics(ch, self.font_size).advance_width)
            .sum();
        width.ceil() as u32
    }

    /// Title centred along the top edge.
    pub fn draw_title(&self, pixels: &mut [u8], width: u32, height: u32, title: &str) {
        if title.is_empty() {
            return;
        }
        let margin = self.line_height() / 2;
        let x = width.saturating_sub(self.measure_width(title)) / 2;
        self.composite(pixels, width, height, title, x, margin, TITLE_COLOR);
    }
}

pub const TITLE_COLOR: [u8; 4] = [30, 30, 30, 230];

fn blend(dst: &mut [u8], color: [u8; 4], coverage: u8) {
    let a = coverage as f32 / 255.0 * (color[3] as f32 / 255.0);
    let inv_a = 1.0 - a;
    for c in 0..3 {
        dst[c] = (color[c] as f32 * a + dst[c] as f32 * inv_a) as u8;
    }
    dst[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_is_an_error() {
        assert!(TextOverlay::from_file(Path::new("/no/such/font.ttf"), 20.0).is_err());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(TextOverlay::from_bytes(b"not a font", 20.0).is_err());
    }

    #[test]
    fn blend_respects_coverage() {
        let mut px = [200, 200, 200, 255];
        blend(&mut px, [0, 0, 0, 255], 0);
        assert_eq!(px, [200, 200, 200, 255]);
        blend(&mut px, [0, 0, 0, 255], 255);
        assert_eq!(px, [0, 0, 0, 255]);
    }
}
