use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub disc_image: Option<PathBuf>,
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_distortion_amount")]
    pub distortion_amount: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            disc_image: None,
            font: None,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            fft_size: default_fft_size(),
            volume: default_volume(),
            distortion_amount: default_distortion_amount(),
        }
    }
}

pub fn default_width() -> u32 { 800 }
pub fn default_height() -> u32 { 600 }
pub fn default_fps() -> u32 { 60 }
pub fn default_sample_rate() -> u32 { 44_100 }
pub fn default_fft_size() -> usize { 256 }
pub fn default_volume() -> f32 { 0.5 }
pub fn default_distortion_amount() -> f32 { 20.0 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Ignoring malformed settings in {}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path first, then `vinylscope.toml`, then the per-user config files.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("vinylscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("vinylscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("vinylscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

/// Analyser window sizes accepted by the tap: powers of two from 32 to 32768.
pub fn validate_fft_size(size: usize) -> anyhow::Result<usize> {
    if size.is_power_of_two() && (32..=32_768).contains(&size) {
        Ok(size)
    } else {
        anyhow::bail!("fft_size must be a power of two between 32 and 32768, got {}", size)
    }
}

pub fn validate_sample_rate(rate: u32) -> anyhow::Result<u32> {
    if (3_000..=768_000).contains(&rate) {
        Ok(rate)
    } else {
        anyhow::bail!("sample_rate must be between 3000 and 768000 Hz, got {}", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[canvas]\nwidth = 320\n").unwrap();
        assert_eq!(config.canvas.width, 320);
        assert_eq!(config.canvas.height, 600);
        assert_eq!(config.canvas.fps, 60);
        assert_eq!(config.audio.fft_size, 256);
        assert!(config.canvas.disc_image.is_none());
    }

    #[test]
    fn reads_audio_section() {
        let config: Config =
            toml::from_str("[audio]\nfft_size = 512\nvolume = 1.5\ndistortion_amount = 40.0\n")
                .unwrap();
        assert_eq!(config.audio.fft_size, 512);
        assert_eq!(config.audio.volume, 1.5);
        assert_eq!(config.audio.distortion_amount, 40.0);
        assert_eq!(config.audio.sample_rate, 44_100);
    }

    #[test]
    fn fft_size_must_be_power_of_two_in_range() {
        assert_eq!(validate_fft_size(256).unwrap(), 256);
        assert!(validate_fft_size(300).is_err());
        assert!(validate_fft_size(16).is_err());
        assert!(validate_fft_size(65_536).is_err());
    }

    #[test]
    fn sample_rate_must_be_usable() {
        assert_eq!(validate_sample_rate(44_100).unwrap(), 44_100);
        assert!(validate_sample_rate(0).is_err());
        assert!(validate_sample_rate(1_000_000).is_err());

        let config: Config = toml::from_str("[audio]\nsample_rate = 0\n").unwrap();
        assert!(validate_sample_rate(config.audio.sample_rate).is_err());
    }
}
