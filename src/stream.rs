//! Streaming conversion API: emit processed cards as they are ready.
//!
//! Unlike the eager [`crate::convert::convert`], [`convert_stream`] yields
//! each [`ProcessedCard`] through a `Stream`. Image downloads for up to
//! `config.concurrency` cards run at once, but the stream is ordered:
//! cards come out in the same order as their markers appear in the export.

use crate::config::ConversionConfig;
use crate::convert::resolve_post_processor;
use crate::error::ImportError;
use crate::output::ProcessedCard;
use crate::pipeline::assemble::{CardAssembler, Cards};
use crate::pipeline::input;
use crate::pipeline::postprocess::post_process_card;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed, ordered stream of processed cards.
///
/// The first `Err` (a malformed marker under [`crate::MarkerPolicy::Abort`])
/// ends the stream.
pub type CardStream = Pin<Box<dyn Stream<Item = Result<ProcessedCard, ImportError>> + Send>>;

/// Read an export file and stream its cards.
///
/// # Returns
/// - `Ok(CardStream)` — ordered stream of `Result<ProcessedCard, ImportError>`
/// - `Err(ImportError)` — the file could not be read or decoded
pub async fn convert_stream(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<CardStream, ImportError> {
    let path = input_path.as_ref();
    info!("Starting streaming conversion: {}", path.display());
    let text = input::read_export(path).await?;
    card_stream(&text, config)
}

/// Stream the cards of already-decoded export text.
pub fn card_stream(text: &str, config: &ConversionConfig) -> Result<CardStream, ImportError> {
    let processor = resolve_post_processor(config)?;
    let schema = Arc::new(config.schema.clone());

    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let assembler = CardAssembler::new(config.schema.clone(), config.marker_policy);
    let cards = Cards::new(assembler, lines.into_iter(), config.html_escape);

    let s = stream::iter(cards)
        .map(move |item| {
            let processor = Arc::clone(&processor);
            let schema = Arc::clone(&schema);
            async move {
                let card = item?;
                Ok(post_process_card(card, &schema, processor.as_ref()).await)
            }
        })
        .buffered(config.concurrency.max(1));

    Ok(Box::pin(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;

    #[tokio::test]
    async fn stream_preserves_input_order() {
        let config = ConversionConfig::builder()
            .schema(FieldSchema::new("Entry #", ["Title"]))
            .concurrency(8)
            .build()
            .unwrap();
        let text: String = (1..=20).map(|i| format!("Entry #{i}\nTitle: t{i}\n")).collect();

        let ordinals: Vec<u64> = card_stream(&text, &config)
            .unwrap()
            .map(|r| r.unwrap().card.ordinal)
            .collect()
            .await;
        assert_eq!(ordinals, (1..=20).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn stream_ends_with_parse_error() {
        let config = ConversionConfig::builder()
            .schema(FieldSchema::new("Entry #", ["Title"]))
            .build()
            .unwrap();
        let items: Vec<_> = card_stream("Entry #1\nEntry #2\nEntry #?:\nEntry #3\n", &config)
            .unwrap()
            .collect()
            .await;
        // Entry #2 is still open when the bad marker arrives, so it is lost
        // together with everything after it.
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().card.ordinal, 1);
        assert!(matches!(items[1], Err(ImportError::MalformedMarker { line: 3, .. })));
    }
}
