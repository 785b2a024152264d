//! Host media store: where downloaded images end up.
//!
//! The flashcard application owns a flat media folder and references files
//! in it by bare name. [`MediaStore`] is the interface the converter needs
//! from it; [`FsMediaStore`] implements it over a plain directory (point it
//! at the profile's `collection.media` folder).

use crate::error::ImportError;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Characters the host refuses in media file names.
static RE_ILLEGAL_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).unwrap());

/// File name used when a reference has no usable basename.
pub const FALLBACK_MEDIA_NAME: &str = "paste";

/// The host's media-store operations used by the image post-processor.
pub trait MediaStore: Send + Sync {
    /// Append an extension derived from `mime` when `name` has none.
    fn add_extension_based_on_mime(&self, name: &str, mime: &str) -> String {
        add_extension_based_on_mime(name, mime)
    }

    /// Persist `data` under (a deduplicated variant of) `name` and return the
    /// name actually used.
    ///
    /// Blocking. The fetcher calls it through `tokio::task::spawn_blocking`.
    fn write_data(&self, name: &str, data: &[u8]) -> io::Result<String>;
}

/// Extension for a Content-Type value, parameters ignored.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    let ext = match essence.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/tiff" => "tif",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" => "oga",
        "audio/opus" => "opus",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/webm" => "weba",
        "audio/aac" => "aac",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => return None,
    };
    Some(ext)
}

pub fn add_extension_based_on_mime(name: &str, mime: &str) -> String {
    if Path::new(name).extension().is_some() {
        return name.to_string();
    }
    match extension_for_mime(mime) {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_string(),
    }
}

/// Strip characters the host rejects; fall back to [`FALLBACK_MEDIA_NAME`].
pub fn clean_media_name(name: &str) -> String {
    let cleaned = RE_ILLEGAL_NAME_CHARS.replace_all(name, "");
    let cleaned = cleaned.trim();
    if cleaned.trim_matches('.').is_empty() {
        FALLBACK_MEDIA_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// A [`MediaStore`] backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    dir: PathBuf,
}

impl FsMediaStore {
    /// Open (creating if needed) the media directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ImportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ImportError::MediaDirUnavailable {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MediaStore for FsMediaStore {
    /// Same name and same bytes reuse the existing file. A name already
    /// taken by different bytes gets a content-hash suffix, so re-importing
    /// the same export never multiplies files.
    fn write_data(&self, name: &str, data: &[u8]) -> io::Result<String> {
        let name = clean_media_name(name);
        let path = self.dir.join(&name);

        match fs::read(&path) {
            Ok(existing) if existing == data => {
                debug!("Media '{}' already present", name);
                return Ok(name);
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::write(&path, data)?;
                debug!("Stored media '{}' ({} bytes)", name, data.len());
                return Ok(name);
            }
            Err(e) => return Err(e),
        }

        let hashed = hashed_name(&name, data);
        let hashed_path = self.dir.join(&hashed);
        if !hashed_path.exists() {
            fs::write(&hashed_path, data)?;
        }
        debug!("Media name '{}' taken, stored as '{}'", name, hashed);
        Ok(hashed)
    }
}

/// `stem-<16 hex of sha256>.ext`
fn hashed_name(name: &str, data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let hex = hex::encode(digest);
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    match path.extension() {
        Some(ext) => format!("{stem}-{}.{}", &hex[..16], ext.to_string_lossy()),
        None => format!("{stem}-{}", &hex[..16]),
    }
}
