mod app;
mod audio;
mod cli;
mod commands;
mod config;
mod encode;
mod error;
mod render;
mod surface;
mod ticker;
mod tracklist;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use app::App;
use audio::analysis::AnalysisSource;
use audio::session::AudioSession;
use audio::sink::{AudioSink, NullSink, WavSink};
use cli::Cli;
use commands::{Command, CommandScript, CommandSource, StdinCommands};
use config::Config;
use encode::ffmpeg::FfmpegSurface;
use render::disc::Disc;
use render::frame::FrameRenderer;
use render::text::TextOverlay;
use surface::{NullSurface, PngSequence, Surface};
use ticker::{LoopMode, RenderLoop};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect vinylscope.toml / global config
    let mut settings = Config::default();
    if let Some(path) = config::find_config(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.width == 800 { cli.width = cfg.canvas.width; }
            if cli.height == 600 { cli.height = cfg.canvas.height; }
            if cli.fps == 60 { cli.fps = cfg.canvas.fps; }
            if cli.fft_size == 256 { cli.fft_size = cfg.audio.fft_size; }
            if cli.font.is_none() {
                cli.font = cfg.canvas.font.clone();
            }
            if cli.disc_image.is_none() {
                cli.disc_image = cfg.canvas.disc_image.clone();
            }
            settings = cfg;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let fft_size = config::validate_fft_size(cli.fft_size)?;
    let sample_rate = config::validate_sample_rate(settings.audio.sample_rate)?;

    // A broken track list leaves the player blank rather than failing.
    let tracks = match tracklist::load_track_list(&cli.tracks) {
        Ok(tracks) => tracks,
        Err(err) => {
            log::error!("{}", err);
            return Ok(());
        }
    };

    log::info!("vinylscope - {}", tracks.title);
    log::info!("Canvas: {}x{} @ {}fps, fft_size={}", cli.width, cli.height, cli.fps, fft_size);

    let sink: Box<dyn AudioSink> = match &cli.audio_out {
        Some(path) => Box::new(WavSink::create(path, sample_rate)?),
        None => Box::new(NullSink),
    };
    let session = AudioSession::new(sample_rate, fft_size, sink);

    let disc = match &cli.disc_image {
        Some(path) => Disc::load(path)?,
        None => Disc::procedural(cli.width.min(cli.height)),
    };
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let renderer = FrameRenderer::new(cli.width, cli.height, session.buffer_len(), disc, rng)?;

    let surface: Box<dyn Surface> = if let Some(output) = &cli.output {
        let track = cli.mux_audio.then(|| tracks.resolve(&tracks.defaultsong));
        Box::new(FfmpegSurface::new(output, track.as_deref(), cli.width, cli.height, cli.fps)?)
    } else if let Some(dir) = &cli.frames_dir {
        Box::new(PngSequence::create(dir)?)
    } else {
        Box::new(NullSurface::default())
    };

    let overlay = match &cli.font {
        Some(path) => {
            let font_size = (cli.height as f32 * 0.05).max(18.0);
            match TextOverlay::from_file(path, font_size) {
                Ok(overlay) => Some(overlay),
                Err(err) => {
                    log::warn!("Title overlay disabled: {:#}", err);
                    None
                }
            }
        }
        None => None,
    };

    let mut app = App::new(
        tracks,
        session,
        renderer,
        surface,
        overlay,
        settings.audio.volume,
        settings.audio.distortion_amount,
    );
    if cli.autoplay {
        app.apply(Command::TogglePlay);
    }

    let mut sources: Vec<Box<dyn CommandSource>> = Vec::new();
    if let Some(path) = &cli.script {
        sources.push(Box::new(CommandScript::load(path)?));
    }
    if cli.stdin {
        sources.push(Box::new(StdinCommands::spawn()));
    }

    let render_loop = RenderLoop {
        fps: cli.fps,
        mode: if cli.offline { LoopMode::Offline } else { LoopMode::Realtime },
        duration: cli.duration,
    };
    let frames = render_loop
        .run(&mut app, &mut sources)
        .context("Render loop failed")?;

    log::info!("Finishing...");
    app.finish()?;

    log::info!("Done! {} frames", frames);
    Ok(())
}
