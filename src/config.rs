//! Configuration types for export-to-TSV conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Only the things that genuinely vary
//! between runs live here: which schema, whether and where to store
//! downloaded images, network limits, and how to treat malformed markers.

use crate::error::ImportError;
use crate::pipeline::postprocess::FieldPostProcessor;
use crate::progress::ProgressCallback;
use crate::schema::{FieldSchema, SchemaVariant};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// User-Agent sent with image downloads.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Anki)";

/// Configuration for a conversion.
///
/// # Example
/// ```rust
/// use dawwen_tsv::{ConversionConfig, SchemaVariant};
///
/// let config = ConversionConfig::builder()
///     .variant(SchemaVariant::Plain)
///     .fetch_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.schema.column_count(), 12);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Field schema fixing the output column order. Default: Schema A (rich).
    pub schema: FieldSchema,

    /// HTML-escape `&`, `<`, `>` in every line. Default: true.
    ///
    /// The importer is told to allow HTML, so raw angle brackets in a note
    /// would otherwise be rendered as markup.
    pub html_escape: bool,

    /// Directory downloaded images are written to (the host's media folder).
    ///
    /// When `None`, image fields keep their raw text unless a custom
    /// [`post_processor`](Self::post_processor) is supplied.
    pub media_dir: Option<PathBuf>,

    /// Per-download timeout in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// User-Agent header for downloads.
    pub user_agent: String,

    /// Cards whose fields are post-processed at once. Default: 4.
    ///
    /// Rows are still written in input order.
    pub concurrency: usize,

    /// What to do with a marker whose ordinal is not a number. Default: abort.
    pub marker_policy: MarkerPolicy,

    /// Pre-built post-processor. Takes precedence over `media_dir`.
    pub post_processor: Option<Arc<dyn FieldPostProcessor>>,

    /// Optional per-card progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Checked between records; when set the conversion stops with
    /// [`ImportError::Cancelled`].
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            schema: FieldSchema::default(),
            html_escape: true,
            media_dir: None,
            fetch_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: 4,
            marker_policy: MarkerPolicy::default(),
            post_processor: None,
            progress_callback: None,
            cancel_flag: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("schema_columns", &self.schema.column_count())
            .field("html_escape", &self.html_escape)
            .field("media_dir", &self.media_dir)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("concurrency", &self.concurrency)
            .field("marker_policy", &self.marker_policy)
            .field(
                "post_processor",
                &self.post_processor.as_ref().map(|_| "<dyn FieldPostProcessor>"),
            )
            .field("progress_callback", &self.progress_callback.is_some())
            .field("cancel_flag", &self.cancel_flag.is_some())
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn variant(mut self, variant: SchemaVariant) -> Self {
        self.config.schema = FieldSchema::for_variant(variant);
        self
    }

    pub fn schema(mut self, schema: FieldSchema) -> Self {
        self.config.schema = schema;
        self
    }

    pub fn html_escape(mut self, v: bool) -> Self {
        self.config.html_escape = v;
        self
    }

    pub fn media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.media_dir = Some(dir.into());
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn marker_policy(mut self, policy: MarkerPolicy) -> Self {
        self.config.marker_policy = policy;
        self
    }

    pub fn post_processor(mut self, processor: Arc<dyn FieldPostProcessor>) -> Self {
        self.config.post_processor = Some(processor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel_flag = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ImportError> {
        let c = &self.config;
        if c.schema.fields().is_empty() {
            return Err(ImportError::InvalidConfig("schema has no fields".into()));
        }
        if c.schema.marker_prefix().trim().is_empty() {
            return Err(ImportError::InvalidConfig(
                "marker prefix must not be blank".into(),
            ));
        }
        if c.fetch_timeout_secs == 0 {
            return Err(ImportError::InvalidConfig(
                "fetch timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of a record-start marker whose ordinal does not parse.
///
/// | Policy | Effect |
/// |--------|--------|
/// | `Abort` | the conversion fails with [`ImportError::MalformedMarker`] (default) |
/// | `Skip`  | the line is logged and kept as continuation text of the current field |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPolicy {
    #[default]
    Abort,
    Skip,
}
