use anyhow::Result;
use std::path::Path;

use super::analysis::{AnalysisBuffer, AnalysisDomain, AnalysisSource, AnalysisTap};
use super::decode::{decode_at_rate, AudioData};
use super::effects::EffectChain;
use super::sink::AudioSink;
use super::source::SignalSource;
use crate::error::PlayerError;

/// Values `set_volume` accepts. Text is parsed the way a slider value is:
/// anything unparseable becomes 0.
pub trait VolumeValue {
    fn to_gain(&self) -> f32;
}

impl VolumeValue for f32 {
    fn to_gain(&self) -> f32 {
        *self
    }
}

impl VolumeValue for f64 {
    fn to_gain(&self) -> f32 {
        *self as f32
    }
}

/// Numeric value of slider text: empty is 0, anything that is not a finite
/// number is NaN.
pub fn slider_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => f64::NAN,
    }
}

impl VolumeValue for &str {
    fn to_gain(&self) -> f32 {
        let value = slider_number(self);
        if value.is_nan() {
            0.0
        } else {
            value as f32
        }
    }
}

impl VolumeValue for String {
    fn to_gain(&self) -> f32 {
        self.as_str().to_gain()
    }
}

/// Source, effect chain, analysis tap and output for one running player.
///
/// Graph: source -> tap -> gain -> high shelf -> low shelf -> distortion -> sink.
pub struct AudioSession {
    sample_rate: u32,
    source: SignalSource,
    chain: EffectChain,
    tap: AnalysisTap,
    sink: Box<dyn AudioSink>,
    block: Vec<f32>,
    frames_processed: u64,
}

impl AudioSession {
    pub fn new(sample_rate: u32, fft_size: usize, sink: Box<dyn AudioSink>) -> Self {
        let tap = AnalysisTap::new(fft_size, sample_rate);
        log::info!(
            "Analyser: fft_size={}, {} bins of {:.2} Hz",
            tap.fft_size(),
            tap.frequency_bin_count(),
            tap.bin_frequency(1)
        );
        Self {
            sample_rate,
            source: SignalSource::new(),
            chain: EffectChain::new(sample_rate),
            tap,
            sink,
            block: Vec::new(),
            frames_processed: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[cfg(test)]
    pub fn chain(&self) -> &EffectChain {
        &self.chain
    }

    #[cfg(test)]
    pub fn tap(&self) -> &AnalysisTap {
        &self.tap
    }

    pub fn source(&self) -> &SignalSource {
        &self.source
    }

    /// Decode `path` and make it the current track. On failure the session
    /// keeps running with no track (silence).
    pub fn load_track(&mut self, path: &Path) -> Result<(), PlayerError> {
        match decode_at_rate(path, self.sample_rate) {
            Ok(audio) => {
                self.source.load(audio);
                Ok(())
            }
            Err(err) => {
                self.source.unload();
                Err(PlayerError::Decode {
                    path: path.display().to_string(),
                    reason: format!("{err:#}"),
                })
            }
        }
    }

    /// Install already decoded audio, bypassing the decoder.
    pub fn load_audio(&mut self, audio: AudioData) {
        self.source.load(audio);
    }

    pub fn play(&mut self) {
        self.source.play();
    }

    pub fn pause(&mut self) {
        self.source.pause();
    }

    pub fn set_volume<V: VolumeValue>(&mut self, value: V) {
        self.chain.set_gain(value.to_gain());
    }

    pub fn toggle_low_shelf(&mut self, enabled: bool) {
        self.chain.set_low_shelf(enabled);
    }

    pub fn toggle_high_shelf(&mut self, enabled: bool) {
        self.chain.set_high_shelf(enabled);
    }

    pub fn toggle_distortion(&mut self, enabled: bool, amount: f32) {
        self.chain.set_distortion(enabled, amount);
    }

    /// Advance the graph by `frames` samples.
    pub fn process(&mut self, frames: usize) -> Result<()> {
        if frames == 0 {
            return Ok(());
        }
        self.block.resize(frames, 0.0);
        self.source.next_block(&mut self.block);
        self.tap.push(&self.block);
        self.chain.process(&mut self.block);
        self.sink.write(&self.block)?;
        self.frames_processed += frames as u64;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        log::info!(
            "Processed {} audio frames ({:.1}s)",
            self.frames_processed,
            self.frames_processed as f64 / self.sample_rate.max(1) as f64
        );
        self.sink.finish()
    }
}

impl AnalysisSource for AudioSession {
    fn read_into(&mut self, domain: AnalysisDomain, out: &mut AnalysisBuffer) {
        self.tap.read_into(domain, out);
    }

    fn buffer_len(&self) -> usize {
        self.tap.frequency_bin_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sink::NullSink;

    fn session() -> AudioSession {
        AudioSession::new(8_000, 64, Box::new(NullSink))
    }

    #[test]
    fn string_volume_becomes_numeric_gain() {
        let mut s = session();
        s.set_volume("0.5");
        assert_eq!(s.chain().params().gain, 0.5);
        s.set_volume(String::from(" 1.25 "));
        assert_eq!(s.chain().params().gain, 1.25);
    }

    #[test]
    fn bad_volume_text_is_silent_and_negative_is_clamped() {
        let mut s = session();
        s.set_volume("loud");
        assert_eq!(s.chain().params().gain, 0.0);
        s.set_volume("");
        assert_eq!(s.chain().params().gain, 0.0);
        s.set_volume(-1.0_f32);
        assert_eq!(s.chain().params().gain, 0.0);
        s.set_volume(0.8_f64);
        assert!((s.chain().params().gain - 0.8).abs() < 1e-6);
    }

    #[test]
    fn non_finite_volume_text_is_silent() {
        let mut s = session();
        for text in ["inf", "-infinity", "NaN", "1e400"] {
            s.set_volume(1.0_f32);
            s.set_volume(text);
            assert_eq!(s.chain().params().gain, 0.0, "{text}");
        }
        assert!(slider_number("inf").is_nan());
        assert_eq!(slider_number("  "), 0.0);
        assert_eq!(slider_number("0.25"), 0.25);
    }

    #[test]
    fn tap_sees_source_before_gain() {
        let mut s = session();
        s.load_audio(AudioData {
            samples: vec![0.5; 256],
            sample_rate: 8_000,
        });
        s.set_volume(0.0_f32);
        s.play();
        s.process(64).unwrap();
        let waveform = s.tap.read(AnalysisDomain::Time);
        assert!(waveform.as_slice().iter().all(|&v| v == 192));
        assert_eq!(s.frames_processed, 64);
    }

    #[test]
    fn paused_session_feeds_silence_to_tap() {
        let mut s = session();
        s.load_audio(AudioData {
            samples: vec![0.5; 256],
            sample_rate: 8_000,
        });
        s.process(64).unwrap();
        let waveform = s.tap.read(AnalysisDomain::Time);
        assert!(waveform.as_slice().iter().all(|&v| v == 128));
    }

    #[test]
    fn failed_load_leaves_no_track() {
        let mut s = session();
        s.load_audio(AudioData {
            samples: vec![0.5; 16],
            sample_rate: 8_000,
        });
        let err = s.load_track(Path::new("/missing/track.ogg")).unwrap_err();
        assert!(matches!(err, PlayerError::Decode { .. }));
        assert!(!s.source().has_track());
    }

    #[test]
    fn shelf_toggle_round_trip_through_session() {
        let mut s = session();
        s.toggle_high_shelf(true);
        s.process(16).unwrap();
        assert_eq!(s.chain().active_params().high_shelf.gain_db, 25.0);
        s.toggle_high_shelf(false);
        s.process(16).unwrap();
        assert_eq!(s.chain().active_params().high_shelf.gain_db, 0.0);
    }
}
