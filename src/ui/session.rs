// Interactive playback session
// Plays over favorites or the local library with line commands on stdin.
// The player clock ticks once per second; when it reports the end of a
// track the queue decides whether to restart, advance or stop.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::player::playback::{format_time, PlaybackState, PlayerState};
use crate::player::queue::{EndAction, Playable, Queue};

const TICK: Duration = Duration::from_secs(1);
const VOLUME_STEP: i32 = 10;

const HELP: &str = "Commands: [n]ext [p]revious [space/pause/play] [s]huffle [r]epeat \
                    [+/-] volume [m]ute [seek <secs>] [l]ist [x] drop current [i]nfo [q]uit";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Next,
    Previous,
    TogglePlay,
    ToggleShuffle,
    ToggleRepeat,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    Seek(f64),
    List,
    DropCurrent,
    Info,
    Quit,
}

impl SessionCommand {
    /// Parses one stdin line. `None` for anything we don't understand.
    pub fn parse(line: &str) -> Option<Self> {
        let raw = line.trim_end_matches(['\r', '\n']);
        // A lone space is play/pause, so check before trimming
        if raw == " " {
            return Some(SessionCommand::TogglePlay);
        }

        let raw = raw.trim();
        if let Some(arg) = raw.strip_prefix("seek") {
            return arg.trim().parse::<f64>().ok().map(SessionCommand::Seek);
        }

        match raw {
            "n" | "next" => Some(SessionCommand::Next),
            "p" | "prev" | "previous" => Some(SessionCommand::Previous),
            "pause" | "play" | "space" => Some(SessionCommand::TogglePlay),
            "s" | "shuffle" => Some(SessionCommand::ToggleShuffle),
            "r" | "repeat" => Some(SessionCommand::ToggleRepeat),
            "+" => Some(SessionCommand::VolumeUp),
            "-" => Some(SessionCommand::VolumeDown),
            "m" | "mute" => Some(SessionCommand::ToggleMute),
            "l" | "list" => Some(SessionCommand::List),
            "x" | "drop" => Some(SessionCommand::DropCurrent),
            "i" | "info" => Some(SessionCommand::Info),
            "q" | "quit" => Some(SessionCommand::Quit),
            _ => None,
        }
    }
}

pub struct PlayerSession<T: Playable> {
    queue: Queue<T>,
    playback: PlaybackState,
    // Hand each newly selected item to the system handler (browser / media player)
    open_items: bool,
}

impl<T: Playable> PlayerSession<T> {
    pub fn new(queue: Queue<T>, open_items: bool) -> Self {
        PlayerSession {
            queue,
            playback: PlaybackState::new(),
            open_items,
        }
    }

    /// Selects the starting item (by id, else the first one) and starts playing.
    /// `None` if there is nothing to play.
    pub fn start(&mut self, start_id: Option<&str>) -> Option<&T> {
        let selected = match start_id {
            Some(id) => self.queue.select_id(id).is_some(),
            None => false,
        } || self.queue.select_first().is_some();

        if !selected {
            return None;
        }
        self.load_current();
        self.playback.play();
        self.queue.current()
    }

    pub async fn run(&mut self) -> Result<()> {
        self.run_with_input(BufReader::new(tokio::io::stdin())).await
    }

    /// Drives the session until `q` or end of input.
    pub async fn run_with_input<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        println!("{HELP}");
        self.print_status();

        let mut lines = input.lines();
        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick(TICK);
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("reading player commands")? else {
                        debug!("input closed, leaving player");
                        break;
                    };
                    match SessionCommand::parse(&line) {
                        Some(command) => {
                            if !self.handle(command) {
                                break;
                            }
                        }
                        None => println!("{HELP}"),
                    }
                }
            }
        }

        self.playback.stop();
        info!("player session ended");
        Ok(())
    }

    /// Applies one command. Returns false when the session should end.
    pub fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Next => {
                if self.queue.next().is_some() {
                    self.load_current();
                } else {
                    println!("Queue is empty!");
                }
            }
            SessionCommand::Previous => {
                if self.queue.previous().is_some() {
                    self.load_current();
                } else {
                    println!("Queue is empty!");
                }
            }
            SessionCommand::TogglePlay => {
                self.playback.toggle();
                self.print_status();
            }
            SessionCommand::ToggleShuffle => {
                let on = self.queue.toggle_shuffle();
                println!("Shuffle {}", on_off(on));
            }
            SessionCommand::ToggleRepeat => {
                let on = self.queue.toggle_repeat();
                println!("Repeat {}", on_off(on));
            }
            SessionCommand::VolumeUp => {
                self.playback.adjust_volume(VOLUME_STEP);
                println!("Volume: {}%", self.playback.volume());
            }
            SessionCommand::VolumeDown => {
                self.playback.adjust_volume(-VOLUME_STEP);
                println!("Volume: {}%", self.playback.volume());
            }
            SessionCommand::ToggleMute => {
                let muted = self.playback.toggle_mute();
                println!("{}", if muted { "Muted" } else { "Unmuted" });
            }
            SessionCommand::Seek(seconds) => {
                self.playback.seek(seconds);
                self.print_status();
            }
            SessionCommand::List => self.print_queue(),
            SessionCommand::DropCurrent => self.drop_current(),
            SessionCommand::Info => self.print_status(),
            SessionCommand::Quit => return false,
        }
        true
    }

    /// Advances the player clock and handles the end of the track.
    pub fn on_tick(&mut self, elapsed: Duration) {
        if !self.playback.tick(elapsed) {
            return;
        }

        match self.queue.on_track_ended() {
            EndAction::Restart => {
                debug!("repeat on, restarting track");
                self.playback.restart();
                self.print_status();
            }
            EndAction::Advance(_) => self.load_current(),
            EndAction::Stop => {
                self.playback.stop();
                println!("Playback finished - queue is empty");
            }
        }
    }

    pub fn queue(&self) -> &Queue<T> {
        &self.queue
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    // Loads the queue's current item into the player (position back to 0:00)
    fn load_current(&mut self) {
        let Some(item) = self.queue.current() else {
            return;
        };
        let duration = item.duration_secs();
        let now_playing = format!("Now playing: {} - {}", item.title(), item.artist());
        let location = item.location();

        self.playback.load(duration);
        println!("{now_playing}");

        if self.open_items {
            if let Err(e) = open::that(&location) {
                warn!(error = %e, %location, "failed to open item");
            }
        }
    }

    // Takes the current item out of this session's queue. It keeps playing
    // until it ends; navigation continues from where it was.
    fn drop_current(&mut self) {
        let Some(current) = self.queue.current().map(|item| item.id().to_string()) else {
            return;
        };
        let remaining: Vec<T> = self
            .queue
            .items()
            .iter()
            .filter(|item| item.id() != current)
            .cloned()
            .collect();
        self.queue.replace_items(remaining);

        if self.queue.is_empty() {
            println!("Queue is now empty; this is the last track.");
        } else {
            println!("Dropped from queue ({} left).", self.queue.len());
        }
    }

    fn print_queue(&self) {
        let current = self.queue.current().map(|item| item.id());
        for (i, item) in self.queue.items().iter().enumerate() {
            let marker = if Some(item.id()) == current { "▶" } else { " " };
            let length = item.duration_secs().map(format_time).unwrap_or_default();
            println!("{marker} {:>2}. {} - {} {}", i + 1, item.title(), item.artist(), length);
        }
    }

    fn print_status(&self) {
        let state = match self.playback.state() {
            PlayerState::Playing => "▶ Playing",
            PlayerState::Paused => "⏸ Paused",
            PlayerState::Stopped => "⏹ Stopped",
        };
        let title = self.queue.current().map(|item| item.title()).unwrap_or("-");
        println!(
            "{} | {} | {} | Volume: {}%{} | Shuffle: {} | Repeat: {} | Queue: {} tracks",
            state,
            title,
            self.playback.progress_label(),
            self.playback.effective_volume(),
            if self.playback.is_muted() { " (muted)" } else { "" },
            on_off(self.queue.is_shuffle()),
            on_off(self.queue.is_repeat()),
            self.queue.len(),
        );
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
