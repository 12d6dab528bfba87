use anyhow::{Context, Result};
use rand::rngs::StdRng;
use std::f32::consts::PI;
use tiny_skia::{Color, Pixmap, Transform};

use super::disc::Disc;
use super::postprocess::{self, PostProcessFlags};
use super::sprites::{BarSprite, CircleSprite};
use crate::audio::analysis::{AnalysisBuffer, AnalysisDomain, AnalysisSource};
use crate::surface::{Frame, Surface};

pub const BACKGROUND: [u8; 3] = [0xee, 0xf6, 0xfc];
/// Mean analysis value above which the disc is considered spinning.
pub const SILENCE_THRESHOLD: f32 = 1.0;
pub const INITIAL_DISC_ROTATION: f32 = 1.0;
pub const BAR_WIDTH: f32 = 15.0;
pub const BAR_MAX_HEIGHT: f32 = 110.0;
/// Vertical offset of the bar fan origin above the canvas centre.
pub const BAR_ORIGIN_LIFT: f32 = 77.0;
pub const BAR_FAN_STEP: f32 = 2.0 * PI / 32.0;
pub const CIRCLE_SCALES: [f32; 3] = [0.75, 0.50, 0.25];
pub const CIRCLE_ALPHA: f32 = 0.5;

/// Toggles read once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationConfig {
    pub use_time_domain: bool,
    /// Radians added to the disc angle per frame while audio is heard.
    pub rotation_change: f32,
    pub show_bars: bool,
    pub show_circles: bool,
    pub show_noise: bool,
    pub show_invert: bool,
    pub show_emboss: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            use_time_domain: false,
            rotation_change: 0.0,
            show_bars: true,
            show_circles: true,
            show_noise: false,
            show_invert: false,
            show_emboss: false,
        }
    }
}

impl VisualizationConfig {
    pub fn domain(&self) -> AnalysisDomain {
        if self.use_time_domain {
            AnalysisDomain::Time
        } else {
            AnalysisDomain::Frequency
        }
    }

    pub fn post_process(&self) -> PostProcessFlags {
        PostProcessFlags {
            noise: self.show_noise,
            invert: self.show_invert,
            emboss: self.show_emboss,
        }
    }
}

/// Renders one visualization frame per tick into an RGBA pixmap.
pub struct FrameRenderer {
    pixmap: Pixmap,
    width: u32,
    height: u32,
    disc: Disc,
    disc_rotation: f32,
    bar: BarSprite,
    circles: Vec<CircleSprite>,
    buffer: AnalysisBuffer,
    rng: StdRng,
}

impl FrameRenderer {
    pub fn new(width: u32, height: u32, buffer_len: usize, disc: Disc, rng: StdRng) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .with_context(|| format!("Invalid canvas size {}x{}", width, height))?;
        let max_radius = height as f32 / 4.0;
        let circles = CIRCLE_SCALES
            .iter()
            .map(|&scale| CircleSprite::new(max_radius, scale))
            .collect();

        Ok(Self {
            pixmap,
            width,
            height,
            disc,
            disc_rotation: INITIAL_DISC_ROTATION,
            bar: BarSprite::new(BAR_WIDTH, BAR_MAX_HEIGHT),
            circles,
            buffer: AnalysisBuffer::new(buffer_len),
            rng,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    pub fn disc_rotation(&self) -> f32 {
        self.disc_rotation
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_mut()
    }

    /// Read analysis, draw every layer and run the pixel passes.
    pub fn draw(&mut self, config: &VisualizationConfig, analysis: &mut dyn AnalysisSource) {
        analysis.read_into(config.domain(), &mut self.buffer);

        let [r, g, b] = BACKGROUND;
        self.pixmap.fill(Color::from_rgba8(r, g, b, 255));

        self.draw_disc(config.rotation_change);

        if config.show_bars {
            self.draw_bars();
        }
        if config.show_circles {
            self.draw_circles();
        }

        let flags = config.post_process();
        if flags.any() {
            let width = self.width as usize;
            postprocess::apply(self.pixmap.data_mut(), width, flags, &mut self.rng);
        }
    }

    pub fn present(&self, surface: &mut dyn Surface, index: u64) -> Result<()> {
        surface.present(&Frame {
            pixels: self.pixmap.data(),
            width: self.width,
            height: self.height,
            index,
        })
    }

    fn draw_disc(&mut self, rotation_change: f32) {
        let (cx, cy) = (self.width as f32 / 2.0, self.height as f32 / 2.0);
        self.disc.draw(&mut self.pixmap, cx, cy, self.disc_rotation);

        if self.buffer.mean() > SILENCE_THRESHOLD {
            self.disc_rotation += rotation_change;
        }
    }

    fn draw_bars(&mut self) {
        let (w, h) = (self.width as f32, self.height as f32);
        let mut transform = Transform::from_translate(
            w / 2.0 - self.bar.bar_width / 2.0,
            h / 2.0 - BAR_ORIGIN_LIFT,
        );
        let step = Transform::from_rotate(BAR_FAN_STEP.to_degrees());

        for &sample in self.buffer.as_slice() {
            transform = transform.pre_translate(self.bar.bar_width, 0.0).pre_concat(step);
            self.bar.update(sample);
            self.bar.draw(&mut self.pixmap, transform);
        }
    }

    fn draw_circles(&mut self) {
        let (w, h) = (self.width as f32, self.height as f32);
        for &sample in self.buffer.as_slice() {
            for circle in &mut self.circles {
                circle.update(sample);
                circle.draw(&mut self.pixmap, w, h, CIRCLE_ALPHA);
            }
        }
    }
}
