use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Where processed audio ends up.
pub trait AudioSink {
    fn write(&mut self, block: &[f32]) -> Result<()>;
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Discards audio. Used for headless runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _block: &[f32]) -> Result<()> {
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Writes the effect chain output as 32-bit float mono WAV.
pub struct WavSink {
    writer: hound::WavWriter<BufWriter<File>>,
    frames: u64,
}

impl WavSink {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
        log::info!("Writing processed audio to {}", path.display());
        Ok(Self { writer, frames: 0 })
    }
}

impl AudioSink for WavSink {
    fn write(&mut self, block: &[f32]) -> Result<()> {
        for &sample in block {
            self.writer
                .write_sample(sample)
                .context("Failed to write audio sample")?;
        }
        self.frames += block.len() as u64;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let frames = self.frames;
        self.writer.finalize().context("Failed to finalize WAV file")?;
        log::info!("Wrote {} audio frames", frames);
        Ok(())
    }
}
