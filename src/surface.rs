use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::PlayerError;

/// One finished RGBA frame.
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub index: u64,
}

/// Where rendered frames end up.
pub trait Surface {
    fn present(&mut self, frame: &Frame) -> Result<()>;

    fn request_fullscreen(&mut self) -> Result<(), PlayerError> {
        Err(PlayerError::UnsupportedFeature("fullscreen"))
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Discards frames; counts them for headless runs.
#[derive(Debug, Default)]
pub struct NullSurface {
    presented: u64,
}

impl Surface for NullSurface {
    fn present(&mut self, _frame: &Frame) -> Result<()> {
        self.presented += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        log::info!("Discarded {} frames (no output configured)", self.presented);
        Ok(())
    }
}

/// Writes `frame_00000.png`, `frame_00001.png`, ... into a directory.
pub struct PngSequence {
    dir: PathBuf,
    written: u64,
}

impl PngSequence {
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create frames directory: {}", dir.display()))?;
        log::info!("Writing PNG frames to {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }
}

impl Surface for PngSequence {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let path = self.frame_path(frame.index);
        image::save_buffer(
            &path,
            frame.pixels,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
        )
        .with_context(|| format!("Failed to save frame {}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        log::info!("Wrote {} frames to {}", self.written, self.dir.display());
        Ok(())
    }
}
