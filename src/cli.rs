use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_TRACKS: &str = "./data/av-data.json";

#[derive(Parser, Debug)]
#[command(name = "vinylscope", about = "Audio player with a spinning-record visualizer")]
pub struct Cli {
    /// Track list JSON (file path or http(s) URL)
    #[arg(default_value = DEFAULT_TRACKS)]
    pub tracks: String,

    /// Settings file (defaults to vinylscope.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Encode frames into a video file with ffmpeg
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write every frame as a PNG into this directory
    #[arg(long, conflicts_with = "output")]
    pub frames_dir: Option<PathBuf>,

    /// Write the processed audio to a WAV file
    #[arg(long)]
    pub audio_out: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Analyser FFT size (power of two, 32-32768)
    #[arg(long, default_value_t = 256)]
    pub fft_size: usize,

    /// Render as fast as possible instead of in real time
    #[arg(long)]
    pub offline: bool,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f32>,

    /// Start playing the default track immediately
    #[arg(long)]
    pub autoplay: bool,

    /// Timed command script (`@<seconds> <command>` per line)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Read commands from stdin while running
    #[arg(long)]
    pub stdin: bool,

    /// Seed for the noise effect
    #[arg(long)]
    pub seed: Option<u64>,

    /// TTF/OTF font for the title overlay
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Picture of the record (a drawn disc is used otherwise)
    #[arg(long)]
    pub disc_image: Option<PathBuf>,

    /// Mux the current track into the video (with --output)
    #[arg(long)]
    pub mux_audio: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_canvas() {
        let cli = Cli::parse_from(["vinylscope"]);
        assert_eq!(cli.tracks, DEFAULT_TRACKS);
        assert_eq!((cli.width, cli.height, cli.fps, cli.fft_size), (800, 600, 60, 256));
        assert!(!cli.offline && !cli.autoplay && !cli.stdin);
    }

    #[test]
    fn output_and_frames_dir_conflict() {
        let res = Cli::try_parse_from(["vinylscope", "-o", "a.mp4", "--frames-dir", "f"]);
        assert!(res.is_err());
    }
}
