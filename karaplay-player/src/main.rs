//! Karaoke player (karaplay) - Main entry point
//!
//! Plays a local playlist through the headless engine: a transition screen
//! for each entry, the song, then the idle screen until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use karaplay_common::config::{load_config, resolve_config_path};
use karaplay_player::engine::HeadlessEngine;
use karaplay_player::fonts::get_font_loader;
use karaplay_player::playback::{MediaPlayer, PLAYER_CLOSING_DURATION};
use karaplay_player::runner::{Playlist, PlaylistRunner};
use karaplay_player::text_generator::AssTextGenerator;
use karaplay_player::Error;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Command-line arguments for karaplay
#[derive(Parser, Debug)]
#[command(name = "karaplay")]
#[command(about = "Unattended karaoke player")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playlist file (TOML); without one, only the idle screen plays
    #[arg(short, long)]
    playlist: Option<PathBuf>,

    /// Root folder of the karaoke files
    #[arg(short, long, env = "KARAPLAY_KARA_FOLDER")]
    kara_folder: Option<PathBuf>,

    /// Render fullscreen
    #[arg(short, long)]
    fullscreen: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "KARAPLAY_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(kara_folder) = &args.kara_folder {
        config.kara_folder = kara_folder.clone();
    }
    if args.fullscreen {
        config.fullscreen = true;
    }

    // Initialize tracing
    let level = args.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("karaplay_player={level},karaplay_common={level},karaplay={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting karaplay {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using built-in defaults"),
    }
    info!("Kara folder: {}", config.kara_folder.display());

    let working_directory = std::env::temp_dir().join(format!("karaplay-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&working_directory)
        .with_context(|| format!("Failed to create {}", working_directory.display()))?;
    debug!("Working directory: {}", working_directory.display());

    let mut font_loader = match &config.fonts.directory {
        Some(directory) => match get_font_loader(directory) {
            Ok(mut loader) => {
                loader.load().context("Failed to load fonts")?;
                Some(loader)
            }
            Err(e @ Error::UnsupportedPlatform(_)) => {
                warn!("Fonts not loaded: {}", e);
                None
            }
            Err(e) => return Err(e).context("Failed to load fonts"),
        },
        None => None,
    };

    let result = run(config, args.playlist, working_directory.clone()).await;

    if let Some(loader) = font_loader.as_mut() {
        loader.unload();
    }
    if let Err(e) = std::fs::remove_dir_all(&working_directory) {
        warn!("Unable to remove {}: {}", working_directory.display(), e);
    }

    result
}

async fn run(
    config: karaplay_common::config::PlayerConfig,
    playlist: Option<PathBuf>,
    working_directory: PathBuf,
) -> Result<()> {
    let playlist = match playlist {
        Some(path) => Playlist::from_file(&path).context("Failed to load playlist")?,
        None => Playlist::default(),
    };

    let engine = Arc::new(HeadlessEngine::new());
    if !config.engine.instance_parameters.is_empty() {
        debug!(
            "Instance parameters ignored by the headless engine: {:?}",
            config.engine.instance_parameters
        );
    }

    let text_generator = Arc::new(AssTextGenerator::new(
        working_directory,
        config.durations.transition(),
        config.durations.idle(),
    ));

    let stop = CancellationToken::new();
    let (errors_tx, mut errors_rx) = mpsc::unbounded_channel();
    let player = Arc::new(MediaPlayer::new(
        engine,
        config,
        text_generator,
        stop.clone(),
        errors_tx,
    ));

    // Mirror player events in the logs
    let mut events = player.callbacks().event_bus().subscribe();
    tokio::spawn(async move {
        while let Ok(notification) = events.recv().await {
            debug!("Event: {:?}", notification.event);
        }
    });

    player.load().await.context("Failed to load player")?;

    let runner = PlaylistRunner::new(Arc::clone(&player), playlist);
    let mut runner = tokio::spawn(runner.run());

    let outcome = tokio::select! {
        _ = shutdown_signal() => Ok(()),
        Some(e) = errors_rx.recv() => {
            error!("Fatal error: {}", e);
            Err(anyhow::Error::new(e))
        }
        joined = &mut runner => match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(anyhow::Error::new(e).context("Playlist runner failed")),
            Err(e) => Err(anyhow::Error::new(e).context("Playlist runner panicked")),
        },
    };

    player.shutdown(PLAYER_CLOSING_DURATION).await;
    if !runner.is_finished() {
        runner.abort();
    }

    info!("Player shutdown complete");
    outcome
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
