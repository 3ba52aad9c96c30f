//! Kara folder fixture and player construction

use super::mock_engine::MockEngine;
use super::recorder::Recorder;
use karaplay_common::config::PlayerConfig;
use karaplay_player::playback::{MediaPlayer, PlaylistEntry, Song};
use karaplay_player::text_generator::AssTextGenerator;
use karaplay_player::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Temporary kara folder, bundled backgrounds and texts directory
pub struct Fixture {
    _root: TempDir,
    pub kara_folder: PathBuf,
    pub backgrounds: PathBuf,
    pub texts: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let kara_folder = root.path().join("kara");
        let backgrounds = root.path().join("backgrounds");
        let texts = root.path().join("texts");
        std::fs::create_dir_all(&kara_folder).unwrap();
        std::fs::create_dir_all(&backgrounds).unwrap();
        std::fs::write(backgrounds.join("transition.png"), b"png").unwrap();
        std::fs::write(backgrounds.join("idle.png"), b"png").unwrap();

        Self {
            _root: root,
            kara_folder,
            backgrounds,
            texts,
        }
    }

    /// Create a file in the kara folder
    pub fn add_file(&self, relative: &str) -> PathBuf {
        let path = self.kara_folder.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"media").unwrap();
        path
    }

    pub fn config(&self) -> PlayerConfig {
        PlayerConfig {
            kara_folder: self.kara_folder.clone(),
            ..Default::default()
        }
    }

    pub fn transition_background(&self) -> PathBuf {
        self.backgrounds.join("transition.png")
    }

    pub fn idle_background(&self) -> PathBuf {
        self.backgrounds.join("idle.png")
    }

    /// Build a player on the mock engine, without loading it
    pub fn player(&self, engine: Arc<MockEngine>, config: PlayerConfig) -> TestPlayer {
        let text_generator = Arc::new(AssTextGenerator::new(
            &self.texts,
            config.durations.transition(),
            config.durations.idle(),
        ));
        let stop = CancellationToken::new();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        let player = MediaPlayer::new(engine.clone(), config, text_generator, stop.clone(), errors_tx)
            .with_backgrounds_directory(&self.backgrounds);
        let player = Arc::new(player);
        let recorder = Recorder::attach(&player);

        TestPlayer {
            player,
            engine,
            recorder,
            errors: errors_rx,
            stop,
        }
    }

    /// Build and load a player with the default configuration
    pub async fn loaded_player(&self) -> TestPlayer {
        self.loaded_player_with(self.config()).await
    }

    pub async fn loaded_player_with(&self, config: PlayerConfig) -> TestPlayer {
        let test_player = self.player(Arc::new(MockEngine::new()), config);
        test_player.player.load().await.unwrap();
        test_player
    }
}

/// Player under test with its collaborators
pub struct TestPlayer {
    pub player: Arc<MediaPlayer>,
    pub engine: Arc<MockEngine>,
    pub recorder: Recorder,
    pub errors: mpsc::UnboundedReceiver<Error>,
    pub stop: CancellationToken,
}

pub fn entry(id: u64, file_path: &Path) -> PlaylistEntry {
    PlaylistEntry {
        id,
        song: Song {
            title: format!("Song {}", id),
            file_path: file_path.to_path_buf(),
        },
        owner: "me".to_string(),
        use_instrumental: false,
    }
}

pub fn instrumental_entry(id: u64, file_path: &Path) -> PlaylistEntry {
    PlaylistEntry {
        use_instrumental: true,
        ..entry(id, file_path)
    }
}
