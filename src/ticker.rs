use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::app::App;
use crate::commands::CommandSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Sleep `1/fps` between ticks.
    Realtime,
    /// Render as fast as possible.
    Offline,
}

/// Splits a sample rate into whole per-tick block sizes, carrying the
/// remainder so every second of ticks adds up to exactly `sample_rate`.
#[derive(Debug, Clone)]
pub struct FramePacer {
    sample_rate: u64,
    fps: u64,
    ticks: u64,
    emitted: u64,
}

impl FramePacer {
    pub fn new(sample_rate: u32, fps: u32) -> Self {
        Self {
            sample_rate: sample_rate as u64,
            fps: fps.max(1) as u64,
            ticks: 0,
            emitted: 0,
        }
    }

    pub fn next_block(&mut self) -> usize {
        self.ticks += 1;
        let target = self.ticks * self.sample_rate / self.fps;
        let block = target - self.emitted;
        self.emitted = target;
        block as usize
    }
}

pub struct RenderLoop {
    pub fps: u32,
    pub mode: LoopMode,
    /// Stop after this many seconds of loop time.
    pub duration: Option<f32>,
}

impl RenderLoop {
    /// Run until quit, the time limit, or (offline) until the track has
    /// finished and nothing is scripted.
    /// Returns the number of frames presented.
    pub fn run(&self, app: &mut App, sources: &mut [Box<dyn CommandSource>]) -> Result<u64> {
        let fps = self.fps.max(1);
        let interval = Duration::from_secs_f64(1.0 / fps as f64);
        let mut pacer = FramePacer::new(app.session().sample_rate(), fps);
        let pb = self.progress_bar(fps);

        log::info!("Render loop started: {} fps, {:?}", fps, self.mode);
        if self.mode == LoopMode::Offline
            && self.duration.is_none()
            && app.session().source().has_track()
            && !app.session().source().is_playing()
            && !sources.iter().any(|s| s.has_pending())
        {
            log::warn!("Offline run with a paused track and no --duration; waiting for play");
        }

        let mut index: u64 = 0;
        loop {
            let time = index as f32 / fps as f32;
            if self.duration.is_some_and(|limit| time >= limit) {
                break;
            }

            for source in sources.iter_mut() {
                for command in source.poll(time) {
                    app.apply(command);
                }
            }
            if app.quit_requested() {
                log::info!("Quit requested");
                break;
            }

            app.tick(pacer.next_block(), index)?;
            index += 1;

            match self.mode {
                LoopMode::Realtime => std::thread::sleep(interval),
                LoopMode::Offline => {
                    if let Some(pb) = &pb {
                        pb.set_position(index);
                    }
                    let source = app.session().source();
                    let done = source.ended() || !source.has_track();
                    if done && !sources.iter().any(|s| s.has_pending()) {
                        log::info!("Nothing left to play");
                        break;
                    }
                }
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("Rendering complete");
        }
        log::info!("Presented {} frames", index);
        Ok(index)
    }

    fn progress_bar(&self, fps: u32) -> Option<ProgressBar> {
        if self.mode != LoopMode::Offline {
            return None;
        }
        let pb = match self.duration {
            Some(limit) => ProgressBar::new((limit * fps as f32).ceil() as u64),
            None => ProgressBar::no_length(),
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    }
}
