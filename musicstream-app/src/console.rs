//! Text rendering and command dispatch for the console front-end.

use crate::command::Command;
use musicstream_core::{PlaybackController, Rating, Result};
use std::fmt::Write as _;

/// Number of songs listed under "Up next"
const UP_NEXT_LIMIT: usize = 4;

pub const HELP_TEXT: &str = "\
Commands:
  play | pause | toggle (p)   control playback
  next | skip (n)             skip to the next song
  like (l) | dislike (d)      rate the current song and move on
  vol <0-100>                 set the volume
  channel <id>                switch channel
  channels                    list channels
  status (s)                  show what is playing
  json                        dump playback state and ratings as JSON
  help                        show this help
  quit (q)                    end the session";

/// What the console loop should do after a command
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit,
}

/// Apply a command to the controller and build the reply text.
///
/// # Errors
///
/// Returns the controller error for rejected operations (e.g. an unknown
/// channel); the playback state is unchanged in that case.
pub fn execute(command: &Command, controller: &mut PlaybackController) -> Result<Outcome> {
    match command {
        Command::Play => controller.play(),
        Command::Pause => controller.pause(),
        Command::Toggle => controller.toggle(),
        Command::Next => controller.skip_next()?,
        Command::Rate(rating) => controller.rate_current(*rating)?,
        Command::Volume(volume) => {
            let applied = controller.set_volume(*volume);
            return Ok(Outcome::Reply(format!("Volume {applied}")));
        }
        Command::Channel(id) => controller.switch_channel(id)?,
        Command::Channels => return Ok(Outcome::Reply(channel_list(controller))),
        Command::Status => {}
        Command::Json => return Ok(Outcome::Reply(state_json(controller))),
        Command::Help => return Ok(Outcome::Reply(HELP_TEXT.to_string())),
        Command::Quit => return Ok(Outcome::Quit),
    }

    status_text(controller).map(Outcome::Reply)
}

/// Now-playing block: status line plus the upcoming songs.
///
/// # Errors
///
/// Only fails if the playback state and catalog are out of sync.
pub fn status_text(controller: &PlaybackController) -> Result<String> {
    let state = controller.state();
    let channel = controller.current_channel()?;
    let song = controller.current_song()?;
    let rating = match controller.ratings().get(&song.id) {
        Some(Rating::Like) => " | liked",
        Some(Rating::Dislike) => " | disliked",
        None => "",
    };

    let mut out = format!(
        "[{}] {} | {} - {} | {} | vol {}{}",
        if state.is_playing { "playing" } else { "paused" },
        channel.name,
        song.title,
        song.artist,
        state.timeline_label(),
        state.volume,
        rating,
    );

    let up_next = controller.up_next(UP_NEXT_LIMIT)?;
    if !up_next.is_empty() {
        out.push_str("\nUp next:");
        for next in up_next {
            let _ = write!(out, "\n  {} - {}", next.title, next.artist);
        }
    }

    Ok(out)
}

fn channel_list(controller: &PlaybackController) -> String {
    let current = &controller.state().channel_id;
    controller
        .catalog()
        .list_channels()
        .iter()
        .map(|channel| {
            let marker = if &channel.id == current { '*' } else { ' ' };
            format!("{marker} {:<14} {}", channel.id, channel.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn state_json(controller: &PlaybackController) -> String {
    let value = serde_json::json!({
        "state": controller.state(),
        "ratings": controller.ratings(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Failed to encode state: {e}"))
}
