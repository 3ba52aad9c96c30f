//! Instrumental track resolution
//!
//! A song can be played with its instrumental version instead of the
//! original audio, either from an external audio file stored next to the
//! song, or from a second audio track embedded in the song file.

use super::entry::PlaylistEntryData;
use crate::engine::MediaEngine;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extensions of the audio files accepted as instrumental
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "ac3", "flac", "m4a", "mka", "mp3", "oga", "ogg", "opus", "wav", "wma",
];

/// Finds the external instrumental file of a song
pub trait InstrumentalLocator: Send + Sync {
    fn locate(&self, song: &Path) -> Option<PathBuf>;
}

/// Looks for an audio file with the same stem in the song directory
#[derive(Debug, Default, Clone, Copy)]
pub struct SiblingFileLocator;

impl InstrumentalLocator for SiblingFileLocator {
    fn locate(&self, song: &Path) -> Option<PathBuf> {
        let stem = song.file_stem()?;
        let directory = song.parent()?;
        let entries = std::fs::read_dir(directory).ok()?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.as_path() != song && path.is_file())
            .filter(|path| path.file_stem() == Some(stem))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            })
            .collect();
        candidates.sort();

        if candidates.len() > 1 {
            warn!(
                "Several instrumental files found for '{}', using '{}'",
                song.display(),
                candidates[0].display()
            );
        }

        candidates.into_iter().next()
    }
}

/// Set up the instrumental of the song stage
///
/// Prefers an external file, attached as a secondary audio source of the
/// song media; otherwise selects the second embedded audio track. The
/// selected track id lands in `song.audio_track_id`, applied once the song
/// plays.
pub fn resolve_instrumental(
    engine: &dyn MediaEngine,
    locator: &dyn InstrumentalLocator,
    song_path: &Path,
    song: &mut PlaylistEntryData,
) -> Result<()> {
    let media = song.media.as_mut().ok_or_else(|| {
        Error::InvalidState(format!("No song media loaded for '{}'", song_path.display()))
    })?;

    if let Some(audio_path) = locator.locate(song_path) {
        info!(
            "Requesting to play instrumental file '{}' for '{}'",
            audio_path.display(),
            song_path.display()
        );

        match engine.add_audio_slave(media, &audio_path) {
            Ok(track_id) => song.audio_track_id = Some(track_id),
            Err(Error::EngineCapability(reason)) => {
                warn!(
                    "{} does not support slaves, cannot add instrumental file: {}",
                    engine.name(),
                    reason
                );
            }
            Err(e) => return Err(e),
        }

        return Ok(());
    }

    let track_ids = engine.audio_track_ids(media)?;
    match track_ids.get(1) {
        Some(&track_id) => {
            info!(
                "Requesting to play instrumental track of '{}'",
                song_path.display()
            );
            song.audio_track_id = Some(track_id);
        }
        None => warn!(
            "Cannot find instrumental file or track for file '{}'",
            song_path.display()
        ),
    }

    Ok(())
}
