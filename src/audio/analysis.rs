use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

pub const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;

/// Which view of the analysed window a read produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisDomain {
    Time,
    Frequency,
}

/// Snapshot of `fft_size / 2` unsigned 8-bit magnitudes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisBuffer {
    data: Vec<u8>,
}

impl AnalysisBuffer {
    pub fn new(len: usize) -> Self {
        Self { data: vec![0; len] }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Arithmetic mean of the samples, 0 for an empty buffer.
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let total: u32 = self.data.iter().map(|&v| v as u32).sum();
        total as f32 / self.data.len() as f32
    }
}

impl From<Vec<u8>> for AnalysisBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// What the frame renderer needs from the audio side.
pub trait AnalysisSource {
    fn read_into(&mut self, domain: AnalysisDomain, out: &mut AnalysisBuffer);
    fn buffer_len(&self) -> usize;
}

/// Non-destructive read point in the audio path.
///
/// Keeps the most recent `fft_size` samples pushed through it and exposes
/// them as a byte waveform or as a smoothed, decibel-scaled spectrum.
pub struct AnalysisTap {
    fft_size: usize,
    sample_rate: u32,
    /// Ring of the last `fft_size` samples; `write_pos` is the oldest.
    window: Vec<f32>,
    write_pos: usize,
    blackman: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    frequency_bytes: Vec<u8>,
    /// Bumped whenever audio is pushed; frequency data is cached per generation.
    generation: u64,
    computed_generation: Option<u64>,
}

impl AnalysisTap {
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let bins = fft_size / 2;
        Self {
            fft_size,
            sample_rate,
            window: vec![0.0; fft_size],
            write_pos: 0,
            blackman: blackman_window(fft_size),
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            frequency_bytes: vec![0; bins],
            generation: 0,
            computed_generation: None,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Centre frequency of bin `k` in Hz.
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.fft_size as f32
    }

    /// Record a processed block. An empty block does not start a new interval.
    pub fn push(&mut self, block: &[f32]) {
        if block.is_empty() {
            return;
        }
        for &sample in block {
            self.window[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.fft_size;
        }
        self.generation += 1;
    }

    #[cfg(test)]
    pub fn read(&mut self, domain: AnalysisDomain) -> AnalysisBuffer {
        let mut out = AnalysisBuffer::new(self.frequency_bin_count());
        self.fill(domain, &mut out);
        out
    }

    fn fill(&mut self, domain: AnalysisDomain, out: &mut AnalysisBuffer) {
        debug_assert_eq!(
            out.len(),
            self.frequency_bin_count(),
            "analysis buffer length must match the tap"
        );
        match domain {
            AnalysisDomain::Time => self.fill_time_domain(out.as_mut_slice()),
            AnalysisDomain::Frequency => {
                if self.computed_generation != Some(self.generation) {
                    self.compute_frequency_data();
                    self.computed_generation = Some(self.generation);
                }
                let n = out.len().min(self.frequency_bytes.len());
                out.as_mut_slice()[..n].copy_from_slice(&self.frequency_bytes[..n]);
            }
        }
    }

    fn ordered_sample(&self, i: usize) -> f32 {
        self.window[(self.write_pos + i) % self.fft_size]
    }

    fn fill_time_domain(&self, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().enumerate().take(self.fft_size) {
            let scaled = (128.0 * (1.0 + self.ordered_sample(i))).floor();
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    fn compute_frequency_data(&mut self) {
        for i in 0..self.fft_size {
            let sample = self.ordered_sample(i) * self.blackman[i];
            self.scratch[i] = Complex::new(sample, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = 1.0 / self.fft_size as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        for k in 0..self.smoothed.len() {
            let magnitude = self.scratch[k].norm() * norm;
            let mut value = SMOOTHING_TIME_CONSTANT * self.smoothed[k]
                + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;
            if !value.is_finite() {
                value = 0.0;
            }
            self.smoothed[k] = value;

            let db = 20.0 * value.log10();
            let scaled = (255.0 / range * (db - MIN_DECIBELS)).floor();
            // -inf dB (silence) lands below zero and clamps to 0.
            self.frequency_bytes[k] = if scaled.is_nan() { 0 } else { scaled.clamp(0.0, 255.0) as u8 };
        }
    }
}

impl AnalysisSource for AnalysisTap {
    fn read_into(&mut self, domain: AnalysisDomain, out: &mut AnalysisBuffer) {
        self.fill(domain, out);
    }

    fn buffer_len(&self) -> usize {
        self.frequency_bin_count()
    }
}

impl fmt::Debug for AnalysisTap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisTap")
            .field("fft_size", &self.fft_size)
            .field("sample_rate", &self.sample_rate)
            .field("generation", &self.generation)
            .finish()
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos()
        })
        .collect()
}
