//! Serial effect chain: gain, high shelf, low shelf, waveshaping distortion.
//!
//! Setters only stage parameters. They are picked up at the start of the next
//! call to [`EffectChain::process`], so a change never lands mid-block.

use std::f32::consts::PI;

pub const SHELF_FREQUENCY_HZ: f32 = 1000.0;
pub const LOW_SHELF_BOOST_DB: f32 = 15.0;
pub const HIGH_SHELF_BOOST_DB: f32 = 25.0;
pub const DEFAULT_SHELF_FREQUENCY_HZ: f32 = 350.0;
pub const DISTORTION_CURVE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfKind {
    Low,
    High,
}

/// Parameters of one shelving filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShelfParams {
    pub frequency: f32,
    pub gain_db: f32,
}

impl Default for ShelfParams {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_SHELF_FREQUENCY_HZ,
            gain_db: 0.0,
        }
    }
}

/// Direct form I biquad with shelf-slope-1 cookbook coefficients.
#[derive(Debug, Clone)]
pub struct ShelfFilter {
    kind: ShelfKind,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl ShelfFilter {
    pub fn new(kind: ShelfKind, params: ShelfParams, sample_rate: u32) -> Self {
        let mut filter = Self {
            kind,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.set_params(params, sample_rate);
        filter
    }

    pub fn set_params(&mut self, params: ShelfParams, sample_rate: u32) {
        let a = 10f32.powf(params.gain_db / 40.0);
        let nyquist = sample_rate as f32 / 2.0;
        let w0 = 2.0 * PI * params.frequency.clamp(0.0, nyquist) / sample_rate as f32;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / 2.0 * std::f32::consts::SQRT_2;
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let (b0, b1, b2, a0, a1, a2) = match self.kind {
            ShelfKind::Low => (
                a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
            ShelfKind::High => (
                a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            let x = *sample;
            let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
                - self.a1 * self.y1
                - self.a2 * self.y2;
            self.x2 = self.x1;
            self.x1 = x;
            self.y2 = self.y1;
            self.y1 = y;
            *sample = y;
        }
    }
}

/// `curve[i] = (PI + 100*x/2) / (PI + 100*|x|*amount)` over 256 points.
///
/// Returns `None` when `amount` is zero, which disables the shaper.
pub fn make_distortion_curve(amount: f32) -> Option<Vec<f32>> {
    if amount == 0.0 {
        return None;
    }
    let n = DISTORTION_CURVE_LEN;
    let curve = (0..n)
        .map(|i| {
            let x = i as f32 * 2.0 / n as f32 - 1.0;
            (PI + 100.0 * x / 2.0) / (PI + 100.0 * x.abs() * amount)
        })
        .collect();
    Some(curve)
}

/// Map one sample through a transfer curve spanning [-1, 1].
pub fn shape_sample(curve: &[f32], x: f32) -> f32 {
    let n = curve.len();
    match n {
        0 => return x,
        1 => return curve[0],
        _ => {}
    }
    let v = (n - 1) as f32 / 2.0 * (x + 1.0);
    if v <= 0.0 {
        return curve[0];
    }
    if v >= (n - 1) as f32 {
        return curve[n - 1];
    }
    let k = v.floor() as usize;
    let f = v - k as f32;
    (1.0 - f) * curve[k] + f * curve[k + 1]
}

/// Everything the setters may change; applied as a unit per block.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainParams {
    pub gain: f32,
    pub low_shelf: ShelfParams,
    pub high_shelf: ShelfParams,
    pub curve: Option<Vec<f32>>,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            gain: 1.0,
            low_shelf: ShelfParams::default(),
            high_shelf: ShelfParams::default(),
            curve: None,
        }
    }
}

#[derive(Debug)]
pub struct EffectChain {
    sample_rate: u32,
    pending: ChainParams,
    active: ChainParams,
    high_shelf: ShelfFilter,
    low_shelf: ShelfFilter,
}

impl EffectChain {
    pub fn new(sample_rate: u32) -> Self {
        let params = ChainParams::default();
        Self {
            sample_rate,
            high_shelf: ShelfFilter::new(ShelfKind::High, params.high_shelf, sample_rate),
            low_shelf: ShelfFilter::new(ShelfKind::Low, params.low_shelf, sample_rate),
            pending: params.clone(),
            active: params,
        }
    }

    /// Parameters that the next block will use.
    #[cfg(test)]
    pub fn params(&self) -> &ChainParams {
        &self.pending
    }

    /// Parameters the last processed block used.
    #[cfg(test)]
    pub fn active_params(&self) -> &ChainParams {
        &self.active
    }

    pub fn set_gain(&mut self, value: f32) {
        self.pending.gain = if value.is_nan() { 0.0 } else { value.max(0.0) };
    }

    pub fn set_low_shelf(&mut self, enabled: bool) {
        Self::toggle_shelf(&mut self.pending.low_shelf, enabled, LOW_SHELF_BOOST_DB);
    }

    pub fn set_high_shelf(&mut self, enabled: bool) {
        Self::toggle_shelf(&mut self.pending.high_shelf, enabled, HIGH_SHELF_BOOST_DB);
    }

    fn toggle_shelf(shelf: &mut ShelfParams, enabled: bool, boost_db: f32) {
        if enabled {
            shelf.frequency = SHELF_FREQUENCY_HZ;
            shelf.gain_db = boost_db;
        } else {
            // stays in the chain as a flat pass-through
            shelf.gain_db = 0.0;
        }
    }

    pub fn set_distortion(&mut self, enabled: bool, amount: f32) {
        self.pending.curve = if enabled {
            make_distortion_curve(amount)
        } else {
            None
        };
    }

    /// Run one block through gain -> high shelf -> low shelf -> distortion.
    pub fn process(&mut self, block: &mut [f32]) {
        self.commit();

        let gain = self.active.gain;
        for sample in block.iter_mut() {
            *sample *= gain;
        }
        self.high_shelf.process(block);
        self.low_shelf.process(block);
        if let Some(curve) = &self.active.curve {
            for sample in block.iter_mut() {
                *sample = shape_sample(curve, *sample);
            }
        }
    }

    fn commit(&mut self) {
        if self.pending == self.active {
            return;
        }
        if self.pending.high_shelf != self.active.high_shelf {
            self.high_shelf.set_params(self.pending.high_shelf, self.sample_rate);
        }
        if self.pending.low_shelf != self.active.low_shelf {
            self.low_shelf.set_params(self.pending.low_shelf, self.sample_rate);
        }
        log::debug!(
            "Effect chain: gain={:.2} low={:.0}dB high={:.0}dB distortion={}",
            self.pending.gain,
            self.pending.low_shelf.gain_db,
            self.pending.high_shelf.gain_db,
            self.pending.curve.is_some()
        );
        self.active = self.pending.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.25 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn rms(block: &[f32]) -> f32 {
        (block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32).sqrt()
    }

    #[test]
    fn zero_amount_yields_no_curve() {
        assert!(make_distortion_curve(0.0).is_none());
    }

    #[test]
    fn curve_has_256_points_over_unit_domain() {
        let amount = 20.0;
        let curve = make_distortion_curve(amount).unwrap();
        assert_eq!(curve.len(), 256);
        // index 0 is x = -1, index 128 is x = 0, the last index stops short of 1
        let expected_first = (PI - 50.0) / (PI + 100.0 * amount);
        assert!((curve[0] - expected_first).abs() < 1e-6);
        assert!((curve[128] - 1.0).abs() < 1e-6);
        let last_x = 255.0 * 2.0 / 256.0 - 1.0;
        let expected_last = (PI + 100.0 * last_x / 2.0) / (PI + 100.0 * last_x * amount);
        assert!((curve[255] - expected_last).abs() < 1e-6);
    }

    #[test]
    fn shaper_interpolates_and_clamps() {
        let curve = vec![-1.0, 0.0, 1.0];
        assert_eq!(shape_sample(&curve, 0.0), 0.0);
        assert_eq!(shape_sample(&curve, 0.5), 0.5);
        assert_eq!(shape_sample(&curve, -3.0), -1.0);
        assert_eq!(shape_sample(&curve, 3.0), 1.0);
        assert_eq!(shape_sample(&[], 0.3), 0.3);
    }

    #[test]
    fn gain_is_clamped_non_negative() {
        let mut chain = EffectChain::new(44_100);
        chain.set_gain(-2.0);
        assert_eq!(chain.params().gain, 0.0);
        chain.set_gain(f32::NAN);
        assert_eq!(chain.params().gain, 0.0);
        chain.set_gain(0.75);
        assert_eq!(chain.params().gain, 0.75);
    }

    #[test]
    fn shelf_toggle_round_trip_restores_flat_gain() {
        let mut chain = EffectChain::new(44_100);
        chain.set_high_shelf(true);
        assert_eq!(chain.params().high_shelf.gain_db, 25.0);
        assert_eq!(chain.params().high_shelf.frequency, 1000.0);
        chain.set_high_shelf(false);
        assert_eq!(chain.params().high_shelf.gain_db, 0.0);

        chain.set_low_shelf(true);
        assert_eq!(chain.params().low_shelf.gain_db, 15.0);
        chain.set_low_shelf(false);
        assert_eq!(chain.params().low_shelf.gain_db, 0.0);
    }

    #[test]
    fn distortion_toggle_round_trip_clears_curve() {
        let mut chain = EffectChain::new(44_100);
        chain.set_distortion(true, 20.0);
        assert!(chain.params().curve.is_some());
        chain.set_distortion(false, 20.0);
        assert!(chain.params().curve.is_none());
        chain.set_distortion(true, 0.0);
        assert!(chain.params().curve.is_none());
    }

    #[test]
    fn changes_apply_on_next_block() {
        let mut chain = EffectChain::new(44_100);
        chain.set_gain(0.5);
        assert_eq!(chain.active_params().gain, 1.0);
        let mut block = vec![1.0; 4];
        chain.process(&mut block);
        assert_eq!(chain.active_params().gain, 0.5);
        assert!(block.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn flat_shelves_pass_signal_through() {
        let mut chain = EffectChain::new(44_100);
        let input = sine(440.0, 44_100, 1024);
        let mut block = input.clone();
        chain.process(&mut block);
        for (a, b) in input.iter().zip(block.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn high_shelf_boosts_treble_not_bass() {
        let sample_rate = 44_100;
        let mut treble_chain = EffectChain::new(sample_rate);
        treble_chain.set_high_shelf(true);
        let mut treble = sine(8_000.0, sample_rate, 8_192);
        treble_chain.process(&mut treble);
        // 25 dB is roughly 17.8x in amplitude
        let treble_gain = rms(&treble[4_096..]) / rms(&sine(8_000.0, sample_rate, 8_192)[4_096..]);
        assert!(treble_gain > 10.0, "treble gain {treble_gain}");

        let mut bass_chain = EffectChain::new(sample_rate);
        bass_chain.set_high_shelf(true);
        let mut bass = sine(50.0, sample_rate, 8_192);
        bass_chain.process(&mut bass);
        let bass_gain = rms(&bass[4_096..]) / rms(&sine(50.0, sample_rate, 8_192)[4_096..]);
        assert!((bass_gain - 1.0).abs() < 0.1, "bass gain {bass_gain}");
    }

    #[test]
    fn low_shelf_boosts_bass() {
        let sample_rate = 44_100;
        let mut chain = EffectChain::new(sample_rate);
        chain.set_low_shelf(true);
        let dry = sine(60.0, sample_rate, 16_384);
        let mut wet = dry.clone();
        chain.process(&mut wet);
        // 15 dB is roughly 5.6x in amplitude
        let gain = rms(&wet[8_192..]) / rms(&dry[8_192..]);
        assert!(gain > 4.5 && gain < 6.5, "bass gain {gain}");
    }
}
