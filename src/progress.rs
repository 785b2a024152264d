//! Progress-callback trait for per-card conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline writes each card. This is the crate's side of the
//! host's progress/notification surface: a terminal progress bar, a GUI
//! dialog, or a log sink can all sit behind it.
//!
//! # Example
//!
//! ```rust
//! use dawwen_tsv::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_card_written(&self, index: usize, ordinal: u64) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("card #{ordinal} written as row {index}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it writes cards.
///
/// Implementations must be `Send + Sync`. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the input has been decoded.
    ///
    /// # Arguments
    /// * `total_lines` — number of lines in the export
    fn on_conversion_start(&self, total_lines: usize) {
        let _ = total_lines;
    }

    /// Called after a card's row has been written.
    ///
    /// # Arguments
    /// * `index`   — 1-indexed output row
    /// * `ordinal` — entry number from the record-start marker
    fn on_card_written(&self, index: usize, ordinal: u64) {
        let _ = (index, ordinal);
    }

    /// Called when a field's post-processing failed and its raw text was kept.
    ///
    /// # Arguments
    /// * `ordinal` — entry number of the card
    /// * `field`   — schema field name
    /// * `error`   — human-readable failure description
    fn on_field_fallback(&self, ordinal: u64, field: &str, error: &str) {
        let _ = (ordinal, field, error);
    }

    /// Called once after the last row was written.
    ///
    /// # Arguments
    /// * `cards`          — rows written
    /// * `fetch_failures` — fields that fell back to raw text
    fn on_conversion_complete(&self, cards: usize, fetch_failures: usize) {
        let _ = (cards, fetch_failures);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        lines: AtomicUsize,
        written: AtomicUsize,
        fallbacks: Mutex<Vec<(u64, String)>>,
        completed: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total_lines: usize) {
            self.lines.store(total_lines, Ordering::SeqCst);
        }

        fn on_card_written(&self, _index: usize, _ordinal: u64) {
            self.written.fetch_add(1, Ordering::SeqCst);
        }

        fn on_field_fallback(&self, ordinal: u64, field: &str, _error: &str) {
            self.fallbacks.lock().unwrap().push((ordinal, field.to_string()));
        }

        fn on_conversion_complete(&self, cards: usize, _fetch_failures: usize) {
            self.completed.store(cards, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(10);
        cb.on_card_written(1, 5);
        cb.on_field_fallback(5, "رابط تحميل الصورة", "404");
        cb.on_conversion_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_conversion_start(30);
        tracker.on_card_written(1, 1);
        tracker.on_card_written(2, 2);
        tracker.on_field_fallback(2, "رابط تحميل الصورة", "timed out");
        tracker.on_conversion_complete(2, 1);

        assert_eq!(tracker.lines.load(Ordering::SeqCst), 30);
        assert_eq!(tracker.written.load(Ordering::SeqCst), 2);
        assert_eq!(
            tracker.fallbacks.lock().unwrap().as_slice(),
            &[(2, "رابط تحميل الصورة".to_string())]
        );
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);
    }
}
