use anyhow::{Context, Result};
use std::path::Path;
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// The record picture spun behind the visualizer.
pub struct Disc {
    image: Pixmap,
}

impl Disc {
    /// Load the picture with the image crate (jpg/png/...).
    pub fn load(path: &Path) -> Result<Self> {
        let rgba = image::open(path)
            .with_context(|| format!("Failed to load disc image: {}", path.display()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut image = Pixmap::new(width, height).context("Disc image has zero size")?;
        for (dst, src) in image.pixels_mut().iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        log::info!("Loaded disc image {} ({}x{})", path.display(), width, height);
        Ok(Self { image })
    }

    /// A plain vinyl record: black platter, grooves, red label.
    pub fn procedural(diameter: u32) -> Self {
        let size = diameter.max(8);
        let mut image = Pixmap::new(size, size).expect("disc size is non-zero");
        let c = size as f32 / 2.0;

        let mut paint = Paint::default();
        paint.anti_alias = true;

        paint.set_color_rgba8(20, 20, 20, 255);
        fill_circle(&mut image, c, c, c, &paint);

        paint.set_color_rgba8(60, 60, 60, 255);
        let stroke = Stroke {
            width: (size as f32 / 400.0).max(1.0),
            ..Stroke::default()
        };
        let mut r = c * 0.92;
        while r > c * 0.4 {
            if let Some(path) = PathBuilder::from_circle(c, c, r) {
                image.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            r -= c * 0.06;
        }

        paint.set_color_rgba8(180, 30, 40, 255);
        fill_circle(&mut image, c, c, c * 0.33, &paint);

        // off-centre mark so the rotation is visible
        paint.set_color_rgba8(240, 220, 200, 255);
        fill_circle(&mut image, c + c * 0.18, c, c * 0.05, &paint);

        paint.set_color(Color::from_rgba8(238, 246, 252, 255));
        fill_circle(&mut image, c, c, c * 0.03, &paint);

        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Centre on `(cx, cy)`, rotate by `angle` radians and draw at half size.
    pub fn draw(&self, target: &mut Pixmap, cx: f32, cy: f32, angle: f32) {
        let transform = Transform::from_translate(cx, cy)
            .pre_concat(Transform::from_rotate(angle.to_degrees()))
            .pre_scale(0.5, 0.5)
            .pre_translate(-(self.width() as f32) / 2.0, -(self.height() as f32) / 2.0);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(0, 0, self.image.as_ref(), &paint, transform, None);
    }
}

fn fill_circle(pixmap: &mut Pixmap, cx: f32, cy: f32, r: f32, paint: &Paint) {
    if let Some(path) = PathBuilder::from_circle(cx, cy, r) {
        pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedural_disc_is_opaque_in_the_middle() {
        let disc = Disc::procedural(64);
        assert_eq!(disc.width(), 64);
        let centre = disc.image.pixel(32, 32).unwrap();
        assert_eq!(centre.alpha(), 255);
        let corner = disc.image.pixel(0, 0).unwrap();
        assert_eq!(corner.alpha(), 0);
    }

    #[test]
    fn draws_at_half_size_around_centre() {
        let disc = Disc::procedural(80);
        let mut target = Pixmap::new(100, 100).unwrap();
        disc.draw(&mut target, 50.0, 50.0, 1.0);

        assert_eq!(target.pixel(50, 50).unwrap().alpha(), 255);
        // half of an 80px disc has a 20px radius
        assert_eq!(target.pixel(50, 25).unwrap().alpha(), 0);
        assert_eq!(target.pixel(50, 35).unwrap().alpha(), 255);
    }

    #[test]
    fn loads_png_from_disk() {
        let path = std::env::temp_dir().join(format!("vinylscope-disc-{}.png", std::process::id()));
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();

        let disc = Disc::load(&path).unwrap();
        assert_eq!((disc.width(), disc.height()), (4, 2));
        let px = disc.image.pixel(1, 1).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 0, 0, 255));

        std::fs::remove_file(&path).unwrap();
    }
}
