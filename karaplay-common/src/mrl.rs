//! Media resource locator (MRL) helpers
//!
//! Media engines identify loaded media by a `file://` URI. These helpers
//! convert between such URIs and local paths; characters that are not valid
//! in a URI (spaces, `#`, non-ASCII) are percent-encoded.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// Convert a local path into a `file://` MRL
///
/// The path must be absolute.
pub fn path_to_mrl(path: &Path) -> Result<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|_| Error::InvalidInput(format!("Not an absolute path: {}", path.display())))
}

/// Convert a `file://` MRL into a local path
pub fn mrl_to_path(mrl: &str) -> Result<PathBuf> {
    let url = Url::parse(mrl).map_err(|e| Error::InvalidInput(format!("Invalid MRL {}: {}", mrl, e)))?;
    if url.scheme() != "file" {
        return Err(Error::InvalidInput(format!("Not a file MRL: {}", mrl)));
    }
    url.to_file_path()
        .map_err(|_| Error::InvalidInput(format!("Cannot convert MRL to path: {}", mrl)))
}
