//! Eager (whole-file) conversion entry points.
//!
//! [`convert`] and [`convert_str`] build the TSV in memory and return it with
//! the cards and statistics. [`convert_to_file`] streams rows into a temp file
//! next to the destination and renames it only once every card has been
//! written, so a failed or cancelled run never leaves a file the importer
//! could pick up.

use crate::config::ConversionConfig;
use crate::error::ImportError;
use crate::media::FsMediaStore;
use crate::output::{Card, ConversionOutput, ConversionStats};
use crate::pipeline::emit::TsvWriter;
use crate::pipeline::fetch::AssetFetcher;
use crate::pipeline::input;
use crate::pipeline::postprocess::{FieldPostProcessor, MediaPostProcessor, PassThrough};
use crate::stream::card_stream;
use futures::StreamExt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a Dawwen export file to TSV in memory.
///
/// # Errors
/// Returns `Err(ImportError)` only for fatal errors:
/// - file not found / unreadable / not UTF-8
/// - malformed entry marker (with the default [`crate::MarkerPolicy::Abort`])
/// - cancellation
///
/// Image download failures are not errors; see
/// [`ConversionStats::fetch_failures`].
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ImportError> {
    let path = input_path.as_ref();
    info!("Starting conversion: {}", path.display());
    let text = input::read_export(path).await?;
    convert_str(&text, config).await
}

/// Convert export text that is already in memory.
pub async fn convert_str(
    text: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ImportError> {
    let mut writer = TsvWriter::new(Vec::new(), config.schema.column_count());
    let mut cards = Vec::new();
    let stats = write_rows(text, config, &mut writer, Path::new("<memory>"), |card| {
        cards.push(card.clone())
    })
    .await?;

    let bytes = writer
        .finish()
        .map_err(|e| ImportError::Internal(format!("in-memory writer: {e}")))?;
    let tsv = String::from_utf8(bytes)
        .map_err(|e| ImportError::Internal(format!("emitted invalid UTF-8: {e}")))?;

    Ok(ConversionOutput { tsv, cards, stats })
}

/// Convert an export and write the TSV to `output_path`.
///
/// Uses atomic write (temp file in the same directory + rename).
pub async fn convert_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, ImportError> {
    let input_path = input_path.as_ref();
    let path = output_path.as_ref();
    info!("Converting {} → {}", input_path.display(), path.display());
    let text = input::read_export(input_path).await?;

    let write_err = |source: std::io::Error| ImportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent).await.map_err(write_err)?;

    let tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    let mut writer = TsvWriter::new(BufWriter::new(tmp), config.schema.column_count());
    let stats = write_rows(&text, config, &mut writer, path, |_| {}).await?;

    let tmp = writer
        .finish()
        .map_err(write_err)?
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ImportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ImportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_path, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pick the post-processor, most specific first:
///
/// 1. a pre-built processor from the config;
/// 2. media downloads, when the schema has an image field and a media
///    directory is configured;
/// 3. [`PassThrough`].
pub(crate) fn resolve_post_processor(
    config: &ConversionConfig,
) -> Result<Arc<dyn FieldPostProcessor>, ImportError> {
    if let Some(ref processor) = config.post_processor {
        return Ok(Arc::clone(processor));
    }

    match (config.schema.rich_field(), config.media_dir.as_ref()) {
        (Some(field), Some(dir)) => {
            let store = Arc::new(FsMediaStore::new(dir)?);
            let fetcher =
                AssetFetcher::new(store, config.fetch_timeout_secs, &config.user_agent)?;
            debug!("Image field '{}' → media dir {}", field, dir.display());
            Ok(Arc::new(MediaPostProcessor::new(field, fetcher)))
        }
        (Some(field), None) => {
            debug!("No media dir configured; '{}' keeps its raw text", field);
            Ok(Arc::new(PassThrough))
        }
        (None, _) => Ok(Arc::new(PassThrough)),
    }
}

/// Drive the card stream into `writer`, firing progress callbacks.
async fn write_rows<W: Write>(
    text: &str,
    config: &ConversionConfig,
    writer: &mut TsvWriter<W>,
    out_path: &Path,
    mut on_card: impl FnMut(&Card),
) -> Result<ConversionStats, ImportError> {
    let start = Instant::now();
    let mut stats = ConversionStats {
        total_lines: text.lines().count(),
        ..Default::default()
    };
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(stats.total_lines);
    }

    let mut rows = card_stream(text, config)?;
    while let Some(item) = rows.next().await {
        if let Some(ref flag) = config.cancel_flag {
            if flag.load(Ordering::SeqCst) {
                info!("Cancelled after {} cards", stats.cards);
                return Err(ImportError::Cancelled { cards: stats.cards });
            }
        }

        let processed = item?;
        writer
            .write_card(&processed.card)
            .map_err(|source| ImportError::OutputWriteFailed {
                path: out_path.to_path_buf(),
                source,
            })?;
        stats.cards += 1;
        stats.stored_assets += processed.stored_assets;
        stats.fetch_failures += processed.fallbacks.len();
        on_card(&processed.card);

        if let Some(ref cb) = config.progress_callback {
            for fallback in &processed.fallbacks {
                cb.on_field_fallback(processed.card.ordinal, &fallback.field, &fallback.error);
            }
            cb.on_card_written(stats.cards, processed.card.ordinal);
        }
    }

    stats.total_duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} cards, {} media stored, {} fallbacks, {}ms",
        stats.cards, stats.stored_assets, stats.fetch_failures, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(stats.cards, stats.fetch_failures);
    }
    Ok(stats)
}
