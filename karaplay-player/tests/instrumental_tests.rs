//! Instrumental resolution integration tests
//!
//! An entry requesting its instrumental is played with:
//! - the sibling audio file attached as secondary source, when one exists
//! - else the second embedded audio track, when the song has several
//! - else the original audio

mod helpers;

use helpers::{entry, instrumental_entry, EngineCall, Fixture, MockEngine};
use karaplay_common::PlayerEventKind;
use karaplay_player::engine::NativeEventKind;
use karaplay_player::playback::{resolve_instrumental, InstrumentalLocator, PlaylistEntryData};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::test]
async fn test_instrumental_file() {
    let fixture = Fixture::new();
    fixture.add_file("song.mkv");
    let audio = fixture.add_file("song.ogg");
    let t = fixture.loaded_player().await;

    t.player
        .set_playlist_entry(instrumental_entry(1, Path::new("song.mkv")))
        .await
        .unwrap();

    assert_eq!(t.engine.count(&EngineCall::AddAudioSlave(audio)), 1);
    assert_eq!(t.engine.count(&EngineCall::AudioTrackIds), 0);
    assert_eq!(t.player.song_audio_track().await, Some(2));
}

#[tokio::test]
async fn test_instrumental_file_unsupported_slaves() {
    let fixture = Fixture::new();
    fixture.add_file("song.mkv");
    fixture.add_file("song.ogg");
    let engine = Arc::new(MockEngine::new());
    engine.set_slave_track_id(None);
    let t = fixture.player(engine, fixture.config());
    t.player.load().await.unwrap();

    t.player
        .set_playlist_entry(instrumental_entry(1, Path::new("song.mkv")))
        .await
        .unwrap();

    // Song still plays, unmodified
    assert_eq!(t.player.song_audio_track().await, None);
    assert_eq!(t.player.current_entry().await, Some(1));
    assert_eq!(t.engine.count(&EngineCall::AudioTrackIds), 0);
}

#[tokio::test]
async fn test_instrumental_track() {
    let fixture = Fixture::new();
    fixture.add_file("song.mkv");
    let t = fixture.loaded_player().await;
    t.engine.set_track_ids(vec![0, 99, 42]);

    t.player
        .set_playlist_entry(instrumental_entry(1, Path::new("song.mkv")))
        .await
        .unwrap();

    assert_eq!(t.engine.count(&EngineCall::AudioTrackIds), 1);
    assert_eq!(t.engine.count_matching(|c| matches!(c, EngineCall::AddAudioSlave(_))), 0);
    assert_eq!(t.player.song_audio_track().await, Some(99));
}

#[tokio::test]
async fn test_no_instrumental_found() {
    let fixture = Fixture::new();
    fixture.add_file("song.mkv");
    let t = fixture.loaded_player().await;
    t.engine.set_track_ids(vec![0]);

    t.player
        .set_playlist_entry(instrumental_entry(1, Path::new("song.mkv")))
        .await
        .unwrap();

    assert_eq!(t.engine.count(&EngineCall::AudioTrackIds), 1);
    assert_eq!(t.engine.count_matching(|c| matches!(c, EngineCall::AddAudioSlave(_))), 0);
    assert_eq!(t.player.song_audio_track().await, None);
    assert_eq!(t.player.current_entry().await, Some(1));

    // The song plays its original audio
    t.engine.fire(NativeEventKind::Playing);
    t.engine.fire(NativeEventKind::EndReached);
    assert!(helpers::wait_until(|| t.engine.count_matching(|c| matches!(c, EngineCall::Play(_))) == 2).await);
    t.engine.fire(NativeEventKind::Playing);
    assert!(helpers::wait_until(|| t.recorder.count(PlayerEventKind::StartedSong) == 1).await);
    assert_eq!(t.engine.count_matching(|c| matches!(c, EngineCall::SetAudioTrack(_))), 0);
}

#[tokio::test]
async fn test_instrumental_not_requested() {
    let fixture = Fixture::new();
    fixture.add_file("song.mkv");
    fixture.add_file("song.ogg");
    let t = fixture.loaded_player().await;
    t.engine.set_track_ids(vec![0, 1]);

    t.player
        .set_playlist_entry(entry(1, Path::new("song.mkv")))
        .await
        .unwrap();

    assert_eq!(t.engine.count(&EngineCall::AudioTrackIds), 0);
    assert_eq!(t.engine.count_matching(|c| matches!(c, EngineCall::AddAudioSlave(_))), 0);
    assert_eq!(t.player.song_audio_track().await, None);
}

#[tokio::test]
async fn test_instrumental_disabled_in_config() {
    let fixture = Fixture::new();
    fixture.add_file("song.mkv");
    fixture.add_file("song.ogg");
    let mut config = fixture.config();
    config.instrumental.enabled = false;
    let t = fixture.loaded_player_with(config).await;

    t.player
        .set_playlist_entry(instrumental_entry(1, Path::new("song.mkv")))
        .await
        .unwrap();

    assert_eq!(t.engine.count_matching(|c| matches!(c, EngineCall::AddAudioSlave(_))), 0);
    assert_eq!(t.player.song_audio_track().await, None);
}

struct FixedLocator(Option<PathBuf>);

impl InstrumentalLocator for FixedLocator {
    fn locate(&self, _song: &Path) -> Option<PathBuf> {
        self.0.clone()
    }
}

#[tokio::test]
async fn test_custom_locator() {
    let fixture = Fixture::new();
    fixture.add_file("song.mkv");
    let elsewhere = fixture.add_file("instrumentals/any name.flac");
    let engine = Arc::new(MockEngine::new());
    let t = fixture.player(engine, fixture.config());
    let player = Arc::try_unwrap(t.player)
        .ok()
        .unwrap()
        .with_instrumental_locator(Arc::new(FixedLocator(Some(elsewhere.clone()))));
    player.load().await.unwrap();

    player
        .set_playlist_entry(instrumental_entry(1, Path::new("song.mkv")))
        .await
        .unwrap();

    assert_eq!(t.engine.count(&EngineCall::AddAudioSlave(elsewhere)), 1);
}

#[test]
fn test_resolve_without_song_media() {
    let engine = MockEngine::new();
    let mut data = PlaylistEntryData::default();

    let result = resolve_instrumental(&engine, &FixedLocator(None), Path::new("song.mkv"), &mut data);

    assert!(result.is_err());
    assert!(engine.calls().is_empty());
}
