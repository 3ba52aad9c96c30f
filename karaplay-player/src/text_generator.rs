//! Subtitle texts of the transition and idle screens
//!
//! Texts are written as ASS subtitle files in a working directory, one file
//! per screen, overwritten each time a screen is generated.

use crate::error::{Error, Result};
use crate::playback::{PlaylistEntry, Stage};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const TRANSITION_TEXT_NAME: &str = "transition.ass";
pub const IDLE_TEXT_NAME: &str = "idle.ass";

/// Information displayed on the idle screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdleInfo {
    /// One line each (engine version, player version, ...)
    pub notes: Vec<String>,
}

/// Generates the overlay texts
pub trait TextGenerator: Send + Sync {
    /// Prepare the generator before the first text
    fn load(&self) -> Result<()> {
        Ok(())
    }

    fn create_transition_text(&self, entry: &PlaylistEntry) -> Result<PathBuf>;

    fn create_idle_text(&self, info: &IdleInfo) -> Result<PathBuf>;

    /// Text of a screen
    ///
    /// The song has no generated text.
    fn create_text(
        &self,
        stage: Stage,
        entry: Option<&PlaylistEntry>,
        info: &IdleInfo,
    ) -> Result<PathBuf> {
        match (stage, entry) {
            (Stage::Transition, Some(entry)) => self.create_transition_text(entry),
            (Stage::Transition, None) => Err(Error::InvalidState(
                "No playlist entry to announce".to_string(),
            )),
            (Stage::Idle, _) => self.create_idle_text(info),
            (Stage::Song, _) => Err(Error::InvalidStage {
                action: "generate text to",
                name: stage.name().to_string(),
            }),
        }
    }
}

/// Writes ASS subtitle files
#[derive(Debug, Clone)]
pub struct AssTextGenerator {
    directory: PathBuf,
    transition_duration: Duration,
    idle_duration: Duration,
}

impl AssTextGenerator {
    pub fn new(directory: impl Into<PathBuf>, transition_duration: Duration, idle_duration: Duration) -> Self {
        Self {
            directory: directory.into(),
            transition_duration,
            idle_duration,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.directory.join(name);
        std::fs::write(&path, content)?;
        debug!("Generated text '{}'", path.display());
        Ok(path)
    }
}

impl TextGenerator for AssTextGenerator {
    fn load(&self) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        Ok(())
    }

    fn create_transition_text(&self, entry: &PlaylistEntry) -> Result<PathBuf> {
        let end = self.transition_duration;
        let mut content = header();
        dialogue(&mut content, "Title", end, &entry.song.title);
        dialogue(&mut content, "Note", end, &format!("Requested by {}", entry.owner));
        self.write(TRANSITION_TEXT_NAME, &content)
    }

    fn create_idle_text(&self, info: &IdleInfo) -> Result<PathBuf> {
        let end = self.idle_duration;
        let mut content = header();
        dialogue(&mut content, "Title", end, "Karaoke");
        for note in &info.notes {
            dialogue(&mut content, "Note", end, note);
        }
        self.write(IDLE_TEXT_NAME, &content)
    }
}

fn header() -> String {
    concat!(
        "[Script Info]\n",
        "ScriptType: v4.00+\n",
        "PlayResX: 1920\n",
        "PlayResY: 1080\n",
        "\n",
        "[V4+ Styles]\n",
        "Format: Name, Fontname, Fontsize, PrimaryColour, Bold, Alignment, MarginV\n",
        "Style: Title, Sans, 96, &H00FFFFFF, -1, 5, 0\n",
        "Style: Note, Sans, 48, &H00D0D0D0, 0, 2, 60\n",
        "\n",
        "[Events]\n",
        "Format: Layer, Start, End, Style, Text\n",
    )
    .to_string()
}

fn dialogue(content: &mut String, style: &str, end: Duration, text: &str) {
    let _ = writeln!(
        content,
        "Dialogue: 0,{},{},{},{}",
        ass_time(Duration::ZERO),
        ass_time(end),
        style,
        escape(text)
    );
}

/// `H:MM:SS.cc`
fn ass_time(time: Duration) -> String {
    let centiseconds = time.as_millis() / 10;
    let seconds = centiseconds / 100;
    format!(
        "{}:{:02}:{:02}.{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60,
        centiseconds % 100
    )
}

/// Keep override blocks and line breaks out of user text
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace(['\r', '\n'], " ")
}
