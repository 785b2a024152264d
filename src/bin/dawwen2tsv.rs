//! CLI binary for dawwen-tsv.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use dawwen_tsv::{
    convert, convert_to_file, ConversionConfig, ConversionProgressCallback, ImportManifest,
    MarkerPolicy, ProgressCallback, SchemaVariant,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner counting written cards, plus one
/// log line for every image that was kept as text.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  {pos} cards  ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_lines: usize) {
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting export of {total_lines} lines…"))
        ));
    }

    fn on_card_written(&self, _index: usize, ordinal: u64) {
        self.bar.set_message(dim(&format!("entry #{ordinal}")));
        self.bar.inc(1);
    }

    fn on_field_fallback(&self, ordinal: u64, field: &str, error: &str) {
        // Keep long errors on one line.
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Entry {:>5}  {}  {}",
            red("✗"),
            ordinal,
            field,
            red(&msg)
        ));
    }

    fn on_conversion_complete(&self, cards: usize, fetch_failures: usize) {
        self.bar.finish_and_clear();
        if fetch_failures == 0 {
            eprintln!("{} {} cards converted", green("✔"), bold(&cards.to_string()));
        } else {
            eprintln!(
                "{} {} cards converted  ({} images kept as text)",
                cyan("⚠"),
                bold(&cards.to_string()),
                red(&fetch_failures.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print TSV to stdout
  dawwen2tsv export.txt

  # Write TSV and download images into the collection's media folder
  dawwen2tsv export.txt -o import.tsv --media-dir ~/Anki/User/collection.media

  # Export without images (11-field schema)
  dawwen2tsv --schema plain export.txt -o import.tsv

  # Also write an import manifest describing the column mapping
  dawwen2tsv export.txt -o import.tsv --manifest import.json

  # Keep malformed entry markers as text instead of aborting
  dawwen2tsv --skip-malformed export.txt -o import.tsv

ENVIRONMENT VARIABLES:
  DAWWEN_OUTPUT           Output TSV path
  DAWWEN_MEDIA_DIR        Directory downloaded images are written to
  DAWWEN_SCHEMA           rich | plain
  DAWWEN_FETCH_TIMEOUT    Per-image timeout in seconds
  DAWWEN_USER_AGENT       User-Agent for image downloads
  RUST_LOG                Override log filter (e.g. dawwen_tsv=debug)
"#;

/// Convert a Dawwen export into TSV for flashcard bulk import.
#[derive(Parser, Debug)]
#[command(
    name = "dawwen2tsv",
    version,
    about = "Convert a Dawwen export into TSV for flashcard bulk import",
    long_about = "Group the entries of a Dawwen text export into one quoted TSV row per note, \
with a fixed column order. Image URLs can be downloaded into the flashcard application's \
media folder and replaced by <img> markup.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path of the Dawwen export (UTF-8 text).
    input: PathBuf,

    /// Write TSV to this file instead of stdout.
    #[arg(short, long, env = "DAWWEN_OUTPUT")]
    output: Option<PathBuf>,

    /// Field schema of the export.
    #[arg(long, env = "DAWWEN_SCHEMA", value_enum, default_value = "rich")]
    schema: SchemaArg,

    /// Download image URLs into this directory.
    #[arg(long, env = "DAWWEN_MEDIA_DIR")]
    media_dir: Option<PathBuf>,

    /// Keep `&`, `<` and `>` as written.
    #[arg(long, env = "DAWWEN_NO_HTML_ESCAPE")]
    no_html_escape: bool,

    /// Per-image download timeout in seconds.
    #[arg(long, env = "DAWWEN_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// User-Agent header for image downloads.
    #[arg(long, env = "DAWWEN_USER_AGENT")]
    user_agent: Option<String>,

    /// Number of cards whose images are fetched at once.
    #[arg(short, long, env = "DAWWEN_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Keep marker lines with an unreadable number as text instead of aborting.
    #[arg(long, env = "DAWWEN_SKIP_MALFORMED")]
    skip_malformed: bool,

    /// Write an import manifest (JSON) next to the TSV. Requires --output.
    #[arg(long, requires = "output")]
    manifest: Option<PathBuf>,

    /// Output structured JSON (ConversionOutput) instead of TSV.
    #[arg(long, conflicts_with = "output")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "DAWWEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DAWWEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DAWWEN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SchemaArg {
    Rich,
    Plain,
}

impl From<SchemaArg> for SchemaVariant {
    fn from(v: SchemaArg) -> Self {
        match v {
            SchemaArg::Rich => SchemaVariant::Rich,
            SchemaArg::Plain => SchemaVariant::Plain,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Quiet the library's INFO logs while the spinner is drawing; stdout
    // output is never shared with logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.output.is_some();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Cancellation ─────────────────────────────────────────────────────
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb, cancel)?;

    // ── Run conversion ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = convert_to_file(&cli.input, output_path, &config)
            .await
            .context("Conversion failed")?;

        if let Some(ref manifest_path) = cli.manifest {
            write_manifest(&config, output_path, manifest_path)?;
        }

        if !cli.quiet {
            eprintln!(
                "{}  {} cards  {} images stored  {}ms  →  {}",
                if stats.fetch_failures == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                stats.cards,
                stats.stored_assets,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let output = convert(&cli.input, &config)
            .await
            .context("Conversion failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.tsv.as_bytes())
                .context("Failed to write to stdout")?;
        }

        if !cli.quiet {
            eprintln!(
                "Converted {} cards in {}ms",
                output.stats.cards, output.stats.total_duration_ms
            );
            if output.stats.fetch_failures > 0 {
                eprintln!(
                    "  {} images kept as text",
                    dim(&output.stats.fetch_failures.to_string())
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: Arc<AtomicBool>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .variant(cli.schema.clone().into())
        .html_escape(!cli.no_html_escape)
        .fetch_timeout_secs(cli.fetch_timeout)
        .concurrency(cli.concurrency)
        .marker_policy(if cli.skip_malformed {
            MarkerPolicy::Skip
        } else {
            MarkerPolicy::Abort
        })
        .cancel_flag(cancel);

    if let Some(ref dir) = cli.media_dir {
        builder = builder.media_dir(dir);
    }
    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn write_manifest(config: &ConversionConfig, tsv_path: &Path, manifest_path: &Path) -> Result<()> {
    let tsv_path = tsv_path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", tsv_path.display()))?;
    ImportManifest::new(&config.schema, tsv_path)
        .write_to(manifest_path)
        .with_context(|| format!("Failed to write manifest {}", manifest_path.display()))
}
