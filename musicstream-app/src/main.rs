mod command;
mod console;

use crate::command::Command;
use crate::console::Outcome;
use musicstream_core::{
    Catalog, CoreError, MusicStreamConfig, PlaybackController, PlaybackEvent, SharedController,
    TickDriver,
};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APP_NAME: &str = "MusicStream";

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match MusicStreamConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                "Created config template at {}, starting with defaults",
                path.display()
            );
            MusicStreamConfig::default()
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            error!(
                "Config file {} has a syntax error: {parse_error}",
                MusicStreamConfig::config_path().display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let catalog = match load_catalog(&config) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            if e.is_fatal_config() {
                error!("Catalog rejected, fix the catalog file and restart: {e}");
            } else {
                error!("Failed to load catalog: {e}");
            }
            std::process::exit(1);
        }
    };

    let controller = match PlaybackController::new(catalog, &config.session) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Cannot start session: {e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(run_session(config, controller));

    // Stdin reads run on a blocking thread that cannot be interrupted
    runtime.shutdown_timeout(Duration::from_millis(200));
}

/// Use the configured catalog file, or the built-in channels when none is set
fn load_catalog(config: &MusicStreamConfig) -> musicstream_core::Result<Catalog> {
    config.catalog.path.as_ref().map_or_else(
        || {
            info!("Using built-in catalog");
            Ok(Catalog::builtin())
        },
        |path| Catalog::load(path),
    )
}

async fn run_session(config: MusicStreamConfig, controller: PlaybackController) {
    let events = controller.subscribe();
    let controller = controller.into_shared();

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let logger = tokio::spawn(log_playback_events(events, cancel_token.clone()));

    let driver =
        TickDriver::from_config(controller.clone(), &config.driver, Some(cancel_token.clone()))
            .start();

    info!("{APP_NAME} session started");
    println!("{}", console::HELP_TEXT);
    print_status(&controller).await;

    run_console(&controller, &cancel_token).await;

    cancel_token.cancel();
    driver.stop().await;
    join_task("Playback event logger", logger).await;

    let ratings = controller.lock().await.ratings().len();
    info!("{APP_NAME} session ended ({ratings} song(s) rated)");
}

/// Read commands from stdin until quit, EOF or cancellation
async fn run_console(controller: &SharedController, cancel_token: &CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Input closed, ending session");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };

                let outcome = {
                    let mut controller = controller.lock().await;
                    console::execute(&command, &mut controller)
                };
                match outcome {
                    Ok(Outcome::Reply(text)) => println!("{text}"),
                    Ok(Outcome::Quit) => break,
                    Err(e) => {
                        warn!("Command {:?} failed: {}", command, e);
                        println!("{e}");
                    }
                }
            }
        }
    }
}

/// Wait for a background task, logging a panic or abort instead of dropping
/// it. Returns whether the task ran to completion.
async fn join_task(name: &str, task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            warn!("{} ended abnormally: {}", name, e);
            false
        }
    }
}

async fn print_status(controller: &SharedController) {
    match console::status_text(&*controller.lock().await) {
        Ok(text) => println!("{text}"),
        Err(e) => error!("Failed to render status: {e}"),
    }
}

/// Log all playback events to the console
async fn log_playback_events(
    mut rx: broadcast::Receiver<PlaybackEvent>,
    cancel_token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel_token.cancelled() => break,
            event = rx.recv() => event,
        };

        match event {
            Ok(event) => match &event {
                PlaybackEvent::ChannelSwitched { channel, song } => {
                    info!(
                        "Channel switched: {} - now playing {} - {}",
                        channel.name, song.artist, song.title
                    );
                }
                PlaybackEvent::SongChanged {
                    song,
                    song_index,
                    reason,
                } => {
                    info!(
                        "Song changed ({:?}): {} - {} [#{}]",
                        reason,
                        song.artist,
                        song.title,
                        song_index + 1
                    );
                }
                PlaybackEvent::PlaybackPaused { elapsed_secs } => {
                    info!("Playback paused at {}s", elapsed_secs);
                }
                PlaybackEvent::PlaybackResumed { elapsed_secs } => {
                    info!("Playback resumed at {}s", elapsed_secs);
                }
                PlaybackEvent::VolumeChanged { volume } => {
                    info!("Volume set to {}", volume);
                }
                PlaybackEvent::SongRated { song_id, rating } => {
                    info!("Song {} rated {}", song_id, rating);
                }
                PlaybackEvent::PositionTick { .. } => {
                    // Too frequent for info level
                }
            },
            Err(broadcast::error::RecvError::Closed) => {
                info!("Playback event channel closed");
                break;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                info!("Missed {} playback events", n);
            }
        }
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = MusicStreamConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = musicstream_core::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
