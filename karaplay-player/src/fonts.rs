//! Fonts used by the generated subtitles
//!
//! On Linux, bundled fonts are made available to the renderer by linking
//! them into the user fonts directory (`~/.fonts`) for the session, unless
//! the same font is already installed system-wide or for the user. Links
//! created by the loader are removed on unload (or drop).

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// System fonts directory
pub const SYSTEM_FONTS_DIRECTORY: &str = "/usr/share/fonts";

/// Extensions of the font files to load
const FONT_EXTENSIONS: &[&str] = &["otf", "ttc", "ttf"];

/// Makes fonts available for the session
pub trait FontLoader: Send {
    fn load(&mut self) -> Result<()>;

    fn unload(&mut self);
}

/// Font loader of the current platform
pub fn get_font_loader(directory: impl Into<PathBuf>) -> Result<Box<dyn FontLoader>> {
    if cfg!(target_os = "linux") {
        let user_directory = dirs::home_dir()
            .map(|home| home.join(".fonts"))
            .ok_or_else(|| Error::Config("Unable to find the home directory".to_string()))?;
        return Ok(Box::new(FontLoaderLinux::new(
            directory,
            SYSTEM_FONTS_DIRECTORY,
            user_directory,
        )));
    }

    Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()))
}

/// Font loader linking fonts into the user directory
#[derive(Debug)]
pub struct FontLoaderLinux {
    directory: PathBuf,
    system_directory: PathBuf,
    user_directory: PathBuf,
    fonts_loaded: Vec<PathBuf>,
}

impl FontLoaderLinux {
    pub fn new(
        directory: impl Into<PathBuf>,
        system_directory: impl Into<PathBuf>,
        user_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            directory: directory.into(),
            system_directory: system_directory.into(),
            user_directory: user_directory.into(),
            fonts_loaded: Vec::new(),
        }
    }

    /// Links created by the loader
    pub fn fonts_loaded(&self) -> &[PathBuf] {
        &self.fonts_loaded
    }

    fn all_fonts(&self) -> Vec<PathBuf> {
        debug!("Scanning fonts directory");
        let fonts: Vec<PathBuf> = WalkDir::new(&self.directory)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            })
            .collect();
        debug!("Found {} font(s) to load", fonts.len());
        fonts
    }

    fn load_font(&mut self, font_path: &Path) -> Result<()> {
        let Some(name) = font_path.file_name() else {
            return Ok(());
        };
        let display_name = name.to_string_lossy();

        if self.system_directory.join(name).is_file() {
            debug!("Font '{}' found in system directory", display_name);
            return Ok(());
        }

        let user_font = self.user_directory.join(name);
        if user_font.is_symlink() {
            // exists() follows the link
            if user_font.exists() {
                debug!("Font '{}' found as symbolic link in user directory", display_name);
                return Ok(());
            }
            debug!(
                "Dead symbolic link found for font '{}' in user directory, removing it",
                display_name
            );
            std::fs::remove_file(&user_font)?;
        } else if user_font.is_file() {
            debug!("Font '{}' found in user directory", display_name);
            return Ok(());
        }

        std::fs::create_dir_all(&self.user_directory)?;
        symlink(font_path, &user_font)?;
        debug!(
            "Font '{}' loaded in user directory: '{}'",
            display_name,
            user_font.display()
        );
        self.fonts_loaded.push(user_font);
        Ok(())
    }
}

impl FontLoader for FontLoaderLinux {
    fn load(&mut self) -> Result<()> {
        for font in self.all_fonts() {
            debug!("Font '{}' found to be loaded", font.display());
            self.load_font(&font)?;
        }
        Ok(())
    }

    fn unload(&mut self) {
        for font in self.fonts_loaded.drain(..) {
            match std::fs::remove_file(&font) {
                Ok(()) => debug!("Font '{}' unloaded", font.display()),
                Err(e) => warn!("Unable to unload font '{}': {}", font.display(), e),
            }
        }
    }
}

impl Drop for FontLoaderLinux {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> Result<()> {
    Ok(std::os::unix::fs::symlink(original, link)?)
}

#[cfg(not(unix))]
fn symlink(_original: &Path, _link: &Path) -> Result<()> {
    Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()))
}
