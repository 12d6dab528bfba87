use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::surface::{Frame, Surface};

pub struct FfmpegSurface {
    child: Child,
    width: u32,
    height: u32,
}

/// Build the ffmpeg argument list for raw RGBA on stdin.
pub fn ffmpeg_args(
    output_path: &Path,
    audio_track: Option<&Path>,
    width: u32,
    height: u32,
    fps: u32,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgba".into(),
        "-video_size".into(), format!("{}x{}", width, height),
        "-framerate".into(), fps.to_string(),
        "-i".into(), "pipe:0".into(),
    ];

    if let Some(audio) = audio_track {
        args.extend(["-i".to_string(), audio.display().to_string()]);
    }

    args.extend([
        "-c:v".into(), "libx264".into(),
        "-pix_fmt".into(), "yuv420p".into(),
        "-crf".into(), "18".into(),
        "-preset".into(), "medium".into(),
    ]);

    if audio_track.is_some() {
        args.extend([
            "-c:a".into(), "aac".into(),
            "-b:a".into(), "192k".into(),
            "-shortest".into(),
        ]);
    }

    args.push(output_path.display().to_string());
    args
}

impl FfmpegSurface {
    pub fn new(
        output_path: &Path,
        audio_track: Option<&Path>,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self> {
        let args = ffmpeg_args(output_path, audio_track, width, height, fps);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!("FFmpeg encoder started: {}x{} @ {}fps -> {}", width, height, fps, output_path.display());

        Ok(Self { child, width, height })
    }
}

impl Surface for FfmpegSurface {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        if frame.width != self.width || frame.height != self.height {
            anyhow::bail!(
                "Frame size {}x{} does not match encoder size {}x{}",
                frame.width, frame.height, self.width, self.height
            );
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(frame.pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}
