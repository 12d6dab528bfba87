//! Player controls as text commands.
//!
//! Every control of the player has a one-line textual form, e.g. `toggle`,
//! `volume 0.8`, `track media/b.mp3`, `emboss on`. Lines come either from
//! stdin while the player runs or from a timed script file.

use anyhow::Context;
use std::collections::VecDeque;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TogglePlay,
    Play,
    Pause,
    /// A track list value (file path as listed).
    SelectTrack(String),
    /// A user supplied audio file.
    Upload(PathBuf),
    /// Slider text; parsed by the audio session.
    Volume(String),
    Bars(bool),
    Circles(bool),
    Noise(bool),
    Invert(bool),
    Emboss(bool),
    TimeDomain(bool),
    HighShelf(bool),
    LowShelf(bool),
    Distortion(bool),
    DistortionAmount(f32),
    Fullscreen,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{command}' expects on/off, got '{value}'")]
    InvalidSwitch { command: &'static str, value: String },

    #[error("'{command}' expects a number, got '{value}'")]
    InvalidNumber { command: &'static str, value: String },

    #[error("'domain' expects time or frequency, got '{0}'")]
    InvalidDomain(String),

    #[error("script line {line}: {reason}")]
    Script { line: usize, reason: String },
}

fn parse_switch(command: &'static str, arg: Option<&str>) -> Result<bool, CommandError> {
    let value = arg.ok_or(CommandError::MissingArgument(command))?;
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(CommandError::InvalidSwitch {
            command,
            value: value.to_string(),
        }),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (line, None),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "toggle" | "play-pause" => Command::TogglePlay,
            "play" => Command::Play,
            "pause" => Command::Pause,
            "track" => Command::SelectTrack(rest.ok_or(CommandError::MissingArgument("track"))?.to_string()),
            "upload" => Command::Upload(PathBuf::from(rest.ok_or(CommandError::MissingArgument("upload"))?)),
            // unparseable text is passed through; the session turns it into silence
            "volume" => Command::Volume(rest.unwrap_or_default().to_string()),
            "bars" => Command::Bars(parse_switch("bars", rest)?),
            "circles" => Command::Circles(parse_switch("circles", rest)?),
            "noise" => Command::Noise(parse_switch("noise", rest)?),
            "invert" => Command::Invert(parse_switch("invert", rest)?),
            "emboss" => Command::Emboss(parse_switch("emboss", rest)?),
            "domain" => {
                let value = rest.ok_or(CommandError::MissingArgument("domain"))?;
                match value.to_ascii_lowercase().as_str() {
                    "time" | "waveform" => Command::TimeDomain(true),
                    "frequency" | "freq" => Command::TimeDomain(false),
                    _ => return Err(CommandError::InvalidDomain(value.to_string())),
                }
            }
            "highshelf" => Command::HighShelf(parse_switch("highshelf", rest)?),
            "lowshelf" => Command::LowShelf(parse_switch("lowshelf", rest)?),
            "distortion" => Command::Distortion(parse_switch("distortion", rest)?),
            "distortion-amount" => {
                let value = rest.ok_or(CommandError::MissingArgument("distortion-amount"))?;
                let amount = value.parse::<f32>().map_err(|_| CommandError::InvalidNumber {
                    command: "distortion-amount",
                    value: value.to_string(),
                })?;
                Command::DistortionAmount(amount)
            }
            "fullscreen" => Command::Fullscreen,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Anything the render loop polls for commands once per tick.
pub trait CommandSource {
    /// Commands due at loop time `time` (seconds).
    fn poll(&mut self, time: f32) -> Vec<Command>;

    /// Whether commands are still scheduled for later.
    fn has_pending(&self) -> bool {
        false
    }
}

/// Commands typed on stdin, parsed on a reader thread.
pub struct StdinCommands {
    rx: Receiver<Result<Command, CommandError>>,
}

impl StdinCommands {
    pub fn spawn() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() || line.trim_start().starts_with('#') {
                    continue;
                }
                if tx.send(line.parse::<Command>()).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }
}

impl CommandSource for StdinCommands {
    fn poll(&mut self, _time: f32) -> Vec<Command> {
        let mut commands = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(Ok(command)) => commands.push(command),
                Ok(Err(err)) => log::warn!("Ignoring command: {}", err),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        commands
    }
}

/// A list of `@<seconds> <command>` lines replayed against the loop clock.
#[derive(Debug, Default)]
pub struct CommandScript {
    entries: VecDeque<(f32, Command)>,
}

impl CommandScript {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let mut entries = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let script_err = |reason: String| CommandError::Script {
                line: idx + 1,
                reason,
            };
            let body = line
                .strip_prefix('@')
                .ok_or_else(|| script_err("expected '@<seconds> <command>'".into()))?;
            let (time, command) = body
                .split_once(char::is_whitespace)
                .ok_or_else(|| script_err("missing command".into()))?;
            let time = time
                .parse::<f32>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .ok_or_else(|| script_err(format!("bad timestamp '{}'", time)))?;
            let command = command.parse::<Command>().map_err(|e| script_err(e.to_string()))?;
            entries.push((time, command));
        }
        // stable: same-time commands keep file order
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self {
            entries: entries.into(),
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read command script: {}", path.display()))?;
        let script = Self::parse(&text)
            .with_context(|| format!("Invalid command script: {}", path.display()))?;
        if script.is_empty() {
            log::warn!("Command script {} has no commands", path.display());
        } else {
            log::info!("Loaded {} scripted commands from {}", script.len(), path.display());
        }
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CommandSource for CommandScript {
    fn poll(&mut self, time: f32) -> Vec<Command> {
        let mut due = Vec::new();
        while let Some((at, _)) = self.entries.front() {
            if *at > time {
                break;
            }
            if let Some((_, command)) = self.entries.pop_front() {
                due.push(command);
            }
        }
        due
    }

    fn has_pending(&self) -> bool {
        !self.entries.is_empty()
    }
}
