use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

/// Bars below this fraction of full height are drawn at [`BAR_FLOOR`].
pub const BAR_VISIBLE_THRESHOLD: f32 = 0.2;
pub const BAR_FLOOR: f32 = 0.02;

/// Raw `(s, s - 128, 255 - s)` color. Channels may fall outside 0..=255;
/// they are clamped only when handed to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteColor {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl SpriteColor {
    pub const BLACK: SpriteColor = SpriteColor { r: 0, g: 0, b: 0 };

    pub fn from_sample(sample: u8) -> Self {
        let s = sample as i32;
        Self {
            r: s,
            g: s - 128,
            b: 255 - s,
        }
    }

    pub fn paint(&self, alpha: f32) -> Paint<'static> {
        let clamp = |c: i32| c.clamp(0, 255) as u8;
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut paint = Paint::default();
        paint.set_color_rgba8(clamp(self.r), clamp(self.g), clamp(self.b), a);
        paint.anti_alias = true;
        paint
    }
}

/// A single bar, re-used for every sample of a frame.
#[derive(Debug, Clone)]
pub struct BarSprite {
    pub bar_width: f32,
    pub max_bar_height: f32,
    pub color: SpriteColor,
    pub percent: f32,
}

impl BarSprite {
    pub fn new(bar_width: f32, max_bar_height: f32) -> Self {
        Self {
            bar_width,
            max_bar_height,
            color: SpriteColor::BLACK,
            percent: 0.0,
        }
    }

    pub fn update(&mut self, sample: u8) {
        let percent = sample as f32 / 255.0;
        self.percent = if percent < BAR_VISIBLE_THRESHOLD { BAR_FLOOR } else { percent };
        self.color = SpriteColor::from_sample(sample);
    }

    pub fn height(&self) -> f32 {
        self.max_bar_height * self.percent
    }

    /// Draw at the origin of `transform`, flipped so the bar grows upward.
    pub fn draw(&self, pixmap: &mut Pixmap, transform: Transform) {
        let Some(rect) = Rect::from_xywh(0.0, 0.0, self.bar_width, self.height()) else {
            return;
        };
        let flipped = transform.pre_scale(1.0, -1.0);
        pixmap.fill_rect(rect, &self.color.paint(1.0), flipped, None);
    }
}

/// A centred disc whose radius follows the sample.
#[derive(Debug, Clone)]
pub struct CircleSprite {
    pub max_radius: f32,
    pub radius: f32,
    pub radius_scale: f32,
    pub color: SpriteColor,
}

impl CircleSprite {
    pub fn new(max_radius: f32, radius_scale: f32) -> Self {
        Self {
            max_radius,
            radius: max_radius,
            radius_scale,
            color: SpriteColor::BLACK,
        }
    }

    pub fn update(&mut self, sample: u8) {
        self.radius = sample as f32 / 255.0 * self.max_radius;
        self.color = SpriteColor::from_sample(sample);
    }

    pub fn draw(&self, pixmap: &mut Pixmap, width: f32, height: f32, alpha: f32) {
        let radius = self.radius * self.radius_scale;
        let Some(path) = PathBuilder::from_circle(width / 2.0, height / 2.0, radius) else {
            return;
        };
        pixmap.fill_path(
            &path,
            &self.color.paint(alpha),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}
