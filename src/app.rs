use anyhow::Result;
use std::path::Path;

use crate::audio::session::{slider_number, AudioSession};
use crate::commands::Command;
use crate::render::frame::{FrameRenderer, VisualizationConfig};
use crate::render::text::TextOverlay;
use crate::surface::Surface;
use crate::tracklist::{TrackList, TrackOption};

/// Disc rotation per frame while playing.
pub const PLAYING_ROTATION: f32 = 0.01;

/// What the control panel shows.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub title: String,
    pub tracks: Vec<TrackOption>,
    pub selected_track: String,
    pub playing: bool,
    pub volume_label: String,
    pub high_shelf: bool,
    pub low_shelf: bool,
    pub distortion: bool,
    pub distortion_amount: f32,
    pub distortion_label: String,
}

/// Slider readout: `round(value / 2 * 100)`, halves rounding up.
pub fn percent_label(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    let rounded = (value / 2.0 * 100.0 + 0.5).floor();
    if rounded.is_infinite() {
        return if rounded > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // -0 reads as 0
    format!("{}", rounded + 0.0)
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

pub struct App {
    session: AudioSession,
    renderer: FrameRenderer,
    surface: Box<dyn Surface>,
    overlay: Option<TextOverlay>,
    tracks: TrackList,
    draw: VisualizationConfig,
    ui: UiState,
    quit: bool,
}

impl App {
    /// Load the default track and bring every control to its start state.
    pub fn new(
        tracks: TrackList,
        session: AudioSession,
        renderer: FrameRenderer,
        surface: Box<dyn Surface>,
        overlay: Option<TextOverlay>,
        initial_volume: f32,
        distortion_amount: f32,
    ) -> Self {
        let ui = UiState {
            title: tracks.title.clone(),
            tracks: tracks.options(),
            selected_track: tracks.defaultsong.clone(),
            playing: false,
            volume_label: String::new(),
            high_shelf: false,
            low_shelf: false,
            distortion: false,
            distortion_amount,
            distortion_label: String::new(),
        };
        let mut app = Self {
            session,
            renderer,
            surface,
            overlay,
            tracks,
            draw: VisualizationConfig::default(),
            ui,
            quit: false,
        };

        log::info!("{}", app.ui.title);
        for option in &app.ui.tracks {
            log::info!("Track: {} ({})", option.label, option.value);
        }
        let default_song = app.tracks.resolve(&app.tracks.defaultsong);
        app.load(&default_song);

        app.session.toggle_high_shelf(app.ui.high_shelf);
        app.session.toggle_low_shelf(app.ui.low_shelf);
        app.apply(Command::Volume(initial_volume.to_string()));
        app.apply(Command::DistortionAmount(distortion_amount));
        app
    }

    #[cfg(test)]
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    #[cfg(test)]
    pub fn draw_config(&self) -> &VisualizationConfig {
        &self.draw
    }

    pub fn session(&self) -> &AudioSession {
        &self.session
    }

    #[cfg(test)]
    pub fn session_mut(&mut self) -> &mut AudioSession {
        &mut self.session
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn apply(&mut self, command: Command) {
        log::debug!("Command: {:?}", command);
        match command {
            Command::TogglePlay => self.toggle_play(),
            Command::Play => {
                if !self.ui.playing {
                    self.toggle_play();
                }
            }
            Command::Pause => {
                if self.ui.playing {
                    self.toggle_play();
                }
            }
            Command::SelectTrack(value) => {
                let path = self.tracks.resolve(&value);
                log::info!("Selected track: {}", value);
                self.ui.selected_track = value;
                self.load(&path);
                self.pause_after_load();
            }
            Command::Upload(path) => {
                self.load(&path);
                self.pause_after_load();
            }
            Command::Volume(text) => {
                self.session.set_volume(text.as_str());
                self.ui.volume_label = percent_label(slider_number(&text));
                log::info!("Volume: {}", self.ui.volume_label);
            }
            Command::Bars(on) => self.draw.show_bars = on,
            Command::Circles(on) => self.draw.show_circles = on,
            Command::Noise(on) => self.draw.show_noise = on,
            Command::Invert(on) => self.draw.show_invert = on,
            Command::Emboss(on) => self.draw.show_emboss = on,
            Command::TimeDomain(on) => self.draw.use_time_domain = on,
            Command::HighShelf(on) => {
                self.ui.high_shelf = on;
                self.session.toggle_high_shelf(on);
                self.log_effects();
            }
            Command::LowShelf(on) => {
                self.ui.low_shelf = on;
                self.session.toggle_low_shelf(on);
                self.log_effects();
            }
            Command::Distortion(on) => {
                self.ui.distortion = on;
                self.session.toggle_distortion(on, self.ui.distortion_amount);
                self.log_effects();
            }
            Command::DistortionAmount(amount) => {
                self.ui.distortion_amount = amount;
                self.session.toggle_distortion(self.ui.distortion, amount);
                self.ui.distortion_label = percent_label(amount as f64);
                log::info!("Distortion amount: {}", self.ui.distortion_label);
            }
            Command::Fullscreen => {
                if let Err(err) = self.surface.request_fullscreen() {
                    log::info!("{}", err);
                }
            }
            Command::Quit => self.quit = true,
        }
    }

    fn toggle_play(&mut self) {
        if self.ui.playing {
            self.session.pause();
            self.ui.playing = false;
            self.draw.rotation_change = 0.0;
        } else {
            self.session.play();
            self.ui.playing = true;
            self.draw.rotation_change = PLAYING_ROTATION;
        }
        log::info!("{}", if self.ui.playing { "Playing" } else { "Paused" });
    }

    fn log_effects(&self) {
        log::info!(
            "Effects: high shelf {}, low shelf {}, distortion {}",
            on_off(self.ui.high_shelf),
            on_off(self.ui.low_shelf),
            on_off(self.ui.distortion)
        );
    }

    fn pause_after_load(&mut self) {
        if self.ui.playing {
            self.toggle_play();
        }
    }

    fn load(&mut self, path: &Path) {
        match self.session.load_track(path) {
            Ok(()) => log::info!(
                "Loaded track {} ({:.1}s)",
                path.display(),
                self.session.source().duration()
            ),
            Err(err) => log::warn!("{}; playing silence", err),
        }
    }

    /// Advance audio by `frames`, draw and present one frame.
    pub fn tick(&mut self, frames: usize, index: u64) -> Result<()> {
        self.session.process(frames)?;
        self.renderer.draw(&self.draw, &mut self.session);

        if let Some(overlay) = &self.overlay {
            let (w, h) = (self.renderer.width(), self.renderer.height());
            overlay.draw_title(self.renderer.pixels_mut(), w, h, &self.ui.title);
        }

        self.renderer.present(self.surface.as_mut(), index)
    }

    pub fn finish(self) -> Result<()> {
        self.surface.finish()?;
        self.session.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::AudioData;
    use crate::audio::sink::NullSink;
    use crate::render::disc::Disc;
    use crate::surface::Frame;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingSurface(Rc<Cell<u64>>);

    impl Surface for CountingSurface {
        fn present(&mut self, frame: &Frame) -> Result<()> {
            assert_eq!(frame.pixels.len(), (frame.width * frame.height * 4) as usize);
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    const TRACKS: &str = r#"{"filepaths":["/missing/a.mp3","/missing/b.mp3"],"songnames":["Song A","Song B"],"defaultsong":"/missing/a.mp3","title":"Demo"}"#;

    fn app_with(surface: Box<dyn Surface>) -> App {
        let tracks = TrackList::parse(TRACKS).unwrap();
        let session = AudioSession::new(8_000, 64, Box::new(NullSink));
        let renderer = FrameRenderer::new(
            64,
            48,
            session.tap().frequency_bin_count(),
            Disc::procedural(32),
            StdRng::seed_from_u64(5),
        )
        .unwrap();
        App::new(tracks, session, renderer, surface, None, 0.5, 20.0)
    }

    fn app() -> App {
        app_with(Box::new(crate::surface::NullSurface::default()))
    }

    #[test]
    fn startup_state_matches_controls() {
        let app = app();
        let ui = app.ui();
        assert_eq!(ui.title, "Demo");
        assert_eq!(ui.tracks[1], TrackOption { label: "Song B".into(), value: "/missing/b.mp3".into() });
        assert_eq!(ui.volume_label, "25");
        assert_eq!(ui.distortion_label, "1000");
        assert!(!ui.playing);
        assert_eq!(app.session().chain().params().gain, 0.5);
        assert!(app.session().chain().params().curve.is_none());
        assert_eq!(app.draw_config(), &VisualizationConfig::default());
    }

    #[test]
    fn toggle_drives_rotation() {
        let mut app = app();
        app.apply(Command::TogglePlay);
        assert!(app.ui().playing);
        assert_eq!(app.draw_config().rotation_change, PLAYING_ROTATION);
        app.apply(Command::TogglePlay);
        assert!(!app.ui().playing);
        assert_eq!(app.draw_config().rotation_change, 0.0);
    }

    #[test]
    fn explicit_play_and_pause_are_idempotent() {
        let mut app = app();
        app.apply(Command::Play);
        app.apply(Command::Play);
        assert!(app.ui().playing);
        app.apply(Command::Pause);
        app.apply(Command::Pause);
        assert!(!app.ui().playing);
    }

    #[test]
    fn selecting_a_track_pauses_playback() {
        let mut app = app();
        app.apply(Command::TogglePlay);
        app.apply(Command::SelectTrack("/missing/b.mp3".into()));
        assert!(!app.ui().playing);
        assert_eq!(app.draw_config().rotation_change, 0.0);
        assert_eq!(app.ui().selected_track, "/missing/b.mp3");
        assert!(!app.session().source().has_track());
    }

    #[test]
    fn volume_updates_gain_and_label() {
        let mut app = app();
        app.apply(Command::Volume("1.5".into()));
        assert_eq!(app.ui().volume_label, "75");
        assert_eq!(app.session().chain().params().gain, 1.5);

        app.apply(Command::Volume("abc".into()));
        assert_eq!(app.ui().volume_label, "NaN");
        assert_eq!(app.session().chain().params().gain, 0.0);
    }

    #[test]
    fn labels_round_like_the_slider_readout() {
        assert_eq!(percent_label(-0.0), "0");
        assert_eq!(percent_label(-0.001), "0");
        assert_eq!(percent_label(-0.01), "0");
        assert_eq!(percent_label(0.01), "1");
        assert_eq!(percent_label(-0.03), "-1");
        assert_eq!(percent_label(f64::NAN), "NaN");
        assert_eq!(percent_label(f64::INFINITY), "Infinity");

        let mut app = app();
        app.apply(Command::Volume("-0.001".into()));
        assert_eq!(app.ui().volume_label, "0");
        app.apply(Command::Volume("inf".into()));
        assert_eq!(app.ui().volume_label, "NaN");
        assert_eq!(app.session().chain().params().gain, 0.0);
    }

    #[test]
    fn effect_toggles_update_the_panel() {
        let mut app = app();
        app.apply(Command::HighShelf(true));
        app.apply(Command::LowShelf(true));
        assert!(app.ui().high_shelf && app.ui().low_shelf);
        assert_eq!(app.session().chain().params().high_shelf.gain_db, 25.0);
        app.apply(Command::HighShelf(false));
        assert!(!app.ui().high_shelf);
        assert_eq!(app.session().chain().params().high_shelf.gain_db, 0.0);
    }

    #[test]
    fn distortion_amount_keeps_enabled_flag() {
        let mut app = app();
        app.apply(Command::DistortionAmount(40.0));
        assert_eq!(app.ui().distortion_label, "2000");
        assert!(app.session().chain().params().curve.is_none());

        app.apply(Command::Distortion(true));
        assert!(app.session().chain().params().curve.is_some());
        app.apply(Command::DistortionAmount(10.0));
        assert!(app.session().chain().params().curve.is_some());
        assert_eq!(app.ui().distortion_amount, 10.0);
    }

    #[test]
    fn visual_toggles_land_in_draw_config() {
        let mut app = app();
        app.apply(Command::Bars(false));
        app.apply(Command::Circles(false));
        app.apply(Command::Noise(true));
        app.apply(Command::Invert(true));
        app.apply(Command::Emboss(true));
        app.apply(Command::TimeDomain(true));
        let c = app.draw_config();
        assert!(!c.show_bars && !c.show_circles);
        assert!(c.show_noise && c.show_invert && c.show_emboss && c.use_time_domain);
    }

    #[test]
    fn fullscreen_on_headless_surface_is_harmless() {
        let mut app = app();
        app.apply(Command::Fullscreen);
        assert!(!app.quit_requested());
        app.apply(Command::Quit);
        assert!(app.quit_requested());
    }

    #[test]
    fn ticks_present_frames_and_spin_the_disc() {
        let count = Rc::new(Cell::new(0));
        let mut app = app_with(Box::new(CountingSurface(count.clone())));
        let rate = app.session().sample_rate();
        app.session.load_audio(AudioData {
            samples: (0..8_000).map(|i| (i as f32 * 0.3).sin() * 0.8).collect(),
            sample_rate: rate,
        });
        app.apply(Command::TogglePlay);
        let start = app.renderer().disc_rotation();
        for i in 0..3 {
            app.tick(200, i).unwrap();
        }
        assert_eq!(count.get(), 3);
        assert!(app.renderer().disc_rotation() > start);
        app.finish().unwrap();
    }
}
