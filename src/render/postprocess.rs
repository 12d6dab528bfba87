//! Pixel passes over a rendered RGBA frame.
//!
//! Passes run in a fixed order: noise, invert, emboss. Each is optional and
//! works in place on the byte buffer.

use rand::Rng;
use rayon::prelude::*;

pub const NOISE_PROBABILITY: f64 = 0.05;
pub const EMBOSS_BIAS: i32 = 127;

/// Which passes to run on a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcessFlags {
    pub noise: bool,
    pub invert: bool,
    pub emboss: bool,
}

impl PostProcessFlags {
    pub fn any(&self) -> bool {
        self.noise || self.invert || self.emboss
    }
}

pub fn apply<R: Rng>(data: &mut [u8], width: usize, flags: PostProcessFlags, rng: &mut R) {
    if flags.noise {
        apply_noise(data, rng);
    }
    if flags.invert {
        apply_invert(data);
    }
    if flags.emboss {
        apply_emboss(data, width);
    }
}

/// Turn roughly one pixel in twenty pure green.
pub fn apply_noise<R: Rng>(data: &mut [u8], rng: &mut R) {
    for px in data.chunks_exact_mut(4) {
        if rng.random::<f64>() < NOISE_PROBABILITY {
            px[0] = 0;
            px[1] = 255;
            px[2] = 0;
        }
    }
}

/// Invert red and green; blue is taken from `255 - alpha`. Alpha is kept.
pub fn apply_invert(data: &mut [u8]) {
    data.par_chunks_exact_mut(4).for_each(|px| {
        let (red, green, alpha) = (px[0], px[1], px[3]);
        px[0] = 255 - red;
        px[1] = 255 - green;
        px[2] = 255 - alpha;
    });
}

/// `127 + 2*c - right - below` on every colour byte, scanning forward.
///
/// Neighbours always sit at higher indices than the byte being written, so
/// the in-place scan only ever reads values that have not been embossed yet.
/// A neighbour beyond the end of the buffer turns the byte to 0.
pub fn apply_emboss(data: &mut [u8], width: usize) {
    let len = data.len();
    let row = width * 4;
    for i in 0..len {
        if i % 4 == 3 {
            continue;
        }
        let (Some(&right), Some(&below)) = (data.get(i + 4), data.get(i + row)) else {
            data[i] = 0;
            continue;
        };
        let value = EMBOSS_BIAS + 2 * data[i] as i32 - right as i32 - below as i32;
        data[i] = value.clamp(0, 255) as u8;
    }
}
