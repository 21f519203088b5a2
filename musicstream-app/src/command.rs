use musicstream_core::Rating;
use std::str::FromStr;
use thiserror::Error;

/// A console command typed by the listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Next,
    Rate(Rating),
    Volume(i32),
    Channel(String),
    Channels,
    Status,
    Json,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0} (type `help` for a list)")]
    Unknown(String),

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid volume: {0}")]
    InvalidVolume(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(CommandError::Empty);
        };
        let arg = parts.next();

        let command = match name.to_ascii_lowercase().as_str() {
            "play" => Self::Play,
            "pause" => Self::Pause,
            "toggle" | "p" => Self::Toggle,
            "next" | "skip" | "n" => Self::Next,
            "like" | "l" => Self::Rate(Rating::Like),
            "dislike" | "d" => Self::Rate(Rating::Dislike),
            "vol" | "volume" => {
                let raw = arg.ok_or(CommandError::MissingArgument("vol"))?;
                // Out-of-range percentages are clamped by the controller
                let volume = raw
                    .parse::<i32>()
                    .map_err(|_| CommandError::InvalidVolume(raw.to_string()))?;
                Self::Volume(volume)
            }
            "channel" | "ch" => {
                let id = arg.ok_or(CommandError::MissingArgument("channel"))?;
                Self::Channel(id.to_string())
            }
            "channels" => Self::Channels,
            "status" | "s" => Self::Status,
            "json" => Self::Json,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}
