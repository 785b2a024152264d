//! Asset fetcher: resolve an image-field reference to bytes and store them.
//!
//! A reference is either a local file (`file://…` or a plain path) read
//! straight from disk, or an `http(s)://` URL fetched with a bounded timeout.
//! Only status 200 counts as success. Every failure is a typed
//! [`FetchError`]; whether to fall back to raw text is the caller's call.

use crate::error::{FetchError, ImportError};
use crate::media::{MediaStore, FALLBACK_MEDIA_NAME};
use crate::pipeline::sanitize::{sanitize_line, unescape_reference};
use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Extensions rendered as `<img>`; anything else becomes a `[sound:…]` tag.
pub const IMAGE_EXTENSIONS: [&str; 10] = [
    "jpg", "jpeg", "png", "tif", "tiff", "gif", "svg", "webp", "ico", "avif",
];

/// A fetched asset persisted in the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Name the media store actually used.
    pub file_name: String,
    /// Markup to put in the field instead of the raw reference.
    pub markup: String,
}

/// Downloads or reads image references and writes them to a [`MediaStore`].
pub struct AssetFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    store: Arc<dyn MediaStore>,
}

impl AssetFetcher {
    pub fn new(
        store: Arc<dyn MediaStore>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ImportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| ImportError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
            store,
        })
    }

    /// Fetch `reference` and store it, returning the media markup.
    pub async fn fetch(&self, reference: &str) -> Result<StoredAsset, FetchError> {
        let reference = unescape_reference(reference.trim());
        if reference.is_empty() {
            return Err(FetchError::EmptyReference);
        }

        let (bytes, content_type) = if is_remote(&reference) {
            self.download(&reference).await?
        } else {
            (read_local(&reference).await?, None)
        };

        let mut name = file_name_from_reference(&reference);
        if let Some(mime) = content_type {
            name = self.store.add_extension_based_on_mime(&name, &mime);
        }

        let stored = self.store_blocking(name, bytes).await?;
        info!("Stored '{}' as media '{}'", reference, stored);

        Ok(StoredAsset {
            markup: media_markup(&stored),
            file_name: stored,
        })
    }

    /// Run the blocking `MediaStore::write_data` on tokio's blocking pool.
    async fn store_blocking(&self, name: String, bytes: Vec<u8>) -> Result<String, FetchError> {
        let store = Arc::clone(&self.store);
        let task_name = name.clone();
        tokio::task::spawn_blocking(move || store.write_data(&task_name, &bytes))
            .await
            .map_err(|e| FetchError::Store {
                name: name.clone(),
                source: std::io::Error::other(e),
            })?
            .map_err(|source| FetchError::Store { name, source })
    }

    async fn download(&self, url: &str) -> Result<(Vec<u8>, Option<String>), FetchError> {
        debug!("Downloading {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_error(url, e))?;

        Ok((bytes.to_vec(), content_type))
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// `http://` or `https://`, case-insensitive.
pub fn is_remote(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn local_path(reference: &str) -> PathBuf {
    match reference.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("file://") => PathBuf::from(&reference[7..]),
        _ => PathBuf::from(reference),
    }
}

async fn read_local(reference: &str) -> Result<Vec<u8>, FetchError> {
    let path = local_path(reference);
    tokio::fs::read(&path)
        .await
        .map_err(|source| FetchError::LocalRead { path, source })
}

/// Basename of the reference, percent-decoded, query string excluded.
pub fn file_name_from_reference(reference: &str) -> String {
    let raw = if is_remote(reference) {
        reqwest::Url::parse(reference)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .unwrap_or_default()
    } else {
        local_path(reference)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let name = percent_decode_str(&raw).decode_utf8_lossy().into_owned();
    if name.trim().is_empty() {
        FALLBACK_MEDIA_NAME.to_string()
    } else {
        name
    }
}

/// Field markup for a stored media file.
///
/// The `<img>` attribute quotes are doubled because the emitter wraps the
/// whole column in quotes.
pub fn media_markup(file_name: &str) -> String {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        format!("<img src=\"\"{file_name}\"\">")
    } else {
        format!("[sound:{}]", sanitize_line(file_name, true))
    }
}
