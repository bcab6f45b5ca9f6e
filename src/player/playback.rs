// ==========================================
// PLAYER STATE
// ==========================================
// Mirrors what the embedded player reports back to us: play/pause state,
// position, duration, volume and mute. There is no audio decoding here;
// the position advances through tick(), which the session calls once
// per second (the same cadence the web UI polled the iframe player at).

use std::time::Duration;

// ==========================================
// PLAYER STATE ENUM
// ==========================================
// One value instead of several booleans: the player can't be both
// Playing and Stopped at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped, // Nothing loaded
    Playing, // Clock is running
    Paused,  // Loaded, clock is frozen
}

pub const DEFAULT_VOLUME: u32 = 50;

#[derive(Debug, Clone)]
pub struct PlaybackState {
    state: PlayerState,
    position: f64,
    duration: Option<f64>,
    volume: u32,
    muted: bool,
    // Set once the end of the current track has been reported
    ended: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        PlaybackState {
            state: PlayerState::Stopped,
            position: 0.0,
            duration: None,
            volume: DEFAULT_VOLUME,
            muted: false,
            ended: false,
        }
    }

    // ==========================================
    // LOADING A TRACK
    // ==========================================
    // Selecting a new item always rewinds to 0:00. Playback only
    // continues if we were already playing; otherwise the new track
    // sits paused until the user presses play.
    pub fn load(&mut self, duration: Option<f64>) {
        self.position = 0.0;
        self.duration = duration.filter(|d| d.is_finite() && *d > 0.0);
        self.ended = false;
        self.state = match self.state {
            PlayerState::Playing => PlayerState::Playing,
            _ => PlayerState::Paused,
        };
    }

    // Same track again from the top (repeat)
    pub fn restart(&mut self) {
        self.position = 0.0;
        self.ended = false;
        self.state = PlayerState::Playing;
    }

    pub fn play(&mut self) {
        if self.state != PlayerState::Stopped {
            self.state = PlayerState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    pub fn toggle(&mut self) -> PlayerState {
        match self.state {
            PlayerState::Playing => self.pause(),
            _ => self.play(),
        }
        self.state
    }

    pub fn stop(&mut self) {
        self.state = PlayerState::Stopped;
        self.position = 0.0;
        self.duration = None;
        self.ended = false;
    }

    // Seeking past the end clamps to the end; the next tick reports it
    pub fn seek(&mut self, seconds: f64) {
        let mut target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if let Some(duration) = self.duration {
            target = target.min(duration);
        }
        self.position = target;
        self.ended = false;
    }

    // ==========================================
    // CLOCK
    // ==========================================
    // Advances the position while playing. Returns true exactly once,
    // on the tick where the track reaches its duration.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.state != PlayerState::Playing || self.ended {
            return false;
        }
        self.position += elapsed.as_secs_f64();

        match self.duration {
            Some(duration) if self.position >= duration => {
                self.position = duration;
                self.ended = true;
                true
            }
            _ => false,
        }
    }

    // ==========================================
    // VOLUME
    // ==========================================
    pub fn set_volume(&mut self, volume: u32) {
        self.volume = volume.min(100);
        self.muted = false;
    }

    pub fn adjust_volume(&mut self, delta: i32) {
        let next = (self.volume as i32 + delta).clamp(0, 100);
        self.set_volume(next as u32);
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    // What the player should actually output
    pub fn effective_volume(&self) -> u32 {
        if self.muted {
            0
        } else {
            self.volume
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    // "1:05 / 3:30", or just the position when the length is unknown
    pub fn progress_label(&self) -> String {
        match self.duration {
            Some(duration) => format!("{} / {}", format_time(self.position), format_time(duration)),
            None => format_time(self.position),
        }
    }
}

/// Formats seconds as `M:SS`, flooring to whole seconds. Minutes are not padded.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_floors_and_pads() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3725.2), "62:05");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn load_resets_position_and_keeps_playing() {
        let mut player = PlaybackState::new();
        player.load(Some(200.0));
        player.play();
        player.tick(Duration::from_secs(30));
        assert_eq!(player.position(), 30.0);

        player.load(Some(100.0));
        assert_eq!(player.position(), 0.0);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn load_while_stopped_stays_paused() {
        let mut player = PlaybackState::new();
        player.load(Some(100.0));
        assert_eq!(player.state(), PlayerState::Paused);
        assert!(!player.tick(Duration::from_secs(1)));
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn tick_reports_end_once() {
        let mut player = PlaybackState::new();
        player.load(Some(2.0));
        player.play();

        assert!(!player.tick(Duration::from_secs(1)));
        assert!(player.tick(Duration::from_secs(1)));
        assert!(!player.tick(Duration::from_secs(1)));
        assert_eq!(player.position(), 2.0);

        player.restart();
        assert_eq!(player.position(), 0.0);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn unknown_duration_never_ends() {
        let mut player = PlaybackState::new();
        player.load(None);
        player.play();
        assert!(!player.tick(Duration::from_secs(10_000)));
    }

    #[test]
    fn seek_clamps_to_track_length() {
        let mut player = PlaybackState::new();
        player.load(Some(90.0));
        player.seek(500.0);
        assert_eq!(player.position(), 90.0);
        player.seek(-4.0);
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn mute_zeroes_output_and_volume_unmutes() {
        let mut player = PlaybackState::new();
        assert!(player.toggle_mute());
        assert_eq!(player.effective_volume(), 0);

        player.adjust_volume(80);
        assert!(!player.is_muted());
        assert_eq!(player.effective_volume(), 100);

        player.adjust_volume(-130);
        assert_eq!(player.volume(), 0);
    }

    #[test]
    fn toggle_switches_between_playing_and_paused() {
        let mut player = PlaybackState::new();
        assert_eq!(player.toggle(), PlayerState::Stopped);

        player.load(Some(10.0));
        assert_eq!(player.toggle(), PlayerState::Playing);
        assert_eq!(player.toggle(), PlayerState::Paused);
    }
}
