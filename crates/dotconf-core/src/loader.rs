//! Source loader
//!
//! Locates a `.env` file from a location (relative path, absolute path, or
//! `file:` URI) and a filename, and reads it as UTF-8 text.

use std::path::PathBuf;

use url::Url;

use crate::error::{Error, Result};

const FILE_SCHEME: &str = "file:";

/// Build the path of `filename` inside `location`
///
/// Backslashes are normalized to `/`, and a location that already names a
/// `.env` file or ends with `/` is reduced to its directory.
pub fn source_path(location: &str, filename: &str) -> Result<PathBuf> {
    let file_location = file_location(location, filename);

    if is_file_uri(&file_location) {
        let url = Url::parse(&file_location)
            .map_err(|e| Error::loading(filename, location, format!("Invalid URI: {}", e)))?;
        url.to_file_path().map_err(|_| {
            Error::loading(
                filename,
                location,
                format!("URI '{}' does not name a local file", url),
            )
        })
    } else {
        Ok(PathBuf::from(file_location))
    }
}

/// Read the source text of `filename` inside `location`
pub fn read_source(location: &str, filename: &str) -> Result<String> {
    let path = source_path(location, filename)?;
    log::debug!("Reading dotenv source from {}", path.display());

    std::fs::read_to_string(&path).map_err(|e| {
        Error::loading(
            filename,
            location,
            format!("Failed to read '{}': {}", path.display(), e),
        )
    })
}

fn file_location(location: &str, filename: &str) -> String {
    let normalized = location.replace('\\', "/");
    let dir = normalized.strip_suffix(".env").unwrap_or(&normalized);
    if dir.is_empty() {
        return filename.to_string();
    }
    let dir = dir.strip_suffix('/').unwrap_or(dir);
    format!("{}/{}", dir, filename)
}

fn is_file_uri(location: &str) -> bool {
    location
        .get(..FILE_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(FILE_SCHEME))
}
