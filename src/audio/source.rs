use super::decode::AudioData;

/// Playback cursor over a decoded track.
///
/// Like a media element it keeps producing blocks while paused or after the
/// end of the track; those blocks are silent.
#[derive(Default)]
pub struct SignalSource {
    track: Option<AudioData>,
    cursor: usize,
    playing: bool,
}

impl SignalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new track, rewinding and keeping the play/pause state.
    pub fn load(&mut self, audio: AudioData) {
        self.track = Some(audio);
        self.cursor = 0;
    }

    /// Drop the current track; the source plays silence.
    pub fn unload(&mut self) {
        self.track = None;
        self.cursor = 0;
    }

    pub fn play(&mut self) {
        if self.ended() {
            self.cursor = 0;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    pub fn ended(&self) -> bool {
        match &self.track {
            Some(track) => self.cursor >= track.samples.len(),
            None => false,
        }
    }

    /// Seconds played of the current track.
    #[cfg(test)]
    pub fn position(&self) -> f32 {
        match &self.track {
            Some(track) if track.sample_rate > 0 => self.cursor as f32 / track.sample_rate as f32,
            _ => 0.0,
        }
    }

    pub fn duration(&self) -> f32 {
        self.track.as_ref().map_or(0.0, AudioData::duration)
    }

    /// Fill `out` with the next samples. Reaching the end stops playback.
    pub fn next_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if !self.playing {
            return;
        }
        let Some(track) = &self.track else {
            return;
        };

        let available = track.samples.len().saturating_sub(self.cursor);
        let n = available.min(out.len());
        out[..n].copy_from_slice(&track.samples[self.cursor..self.cursor + n]);
        self.cursor += n;

        if self.cursor >= track.samples.len() {
            log::info!("Track finished");
            self.playing = false;
        }
    }
}
