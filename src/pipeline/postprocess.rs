//! Field post-processing: the per-field hook run on every completed card.
//!
//! A [`FieldPostProcessor`] may claim a field and turn its raw text into a
//! stored asset. It reports failure as a typed [`FetchError`] and never
//! decides what happens next; [`post_process_card`] owns the fallback
//! policy: keep the raw text, log, and count the failure. Row and column
//! counts are never affected.

use crate::error::FetchError;
use crate::output::{Card, FieldFallback, ProcessedCard};
use crate::pipeline::fetch::{AssetFetcher, StoredAsset};
use crate::schema::FieldSchema;
use futures::future::BoxFuture;
use tracing::warn;

/// Optional transform applied to each field of a completed card.
pub trait FieldPostProcessor: Send + Sync {
    /// `Ok(None)` leaves the field's raw text in place.
    fn process<'a>(
        &'a self,
        field: &'a str,
        raw: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredAsset>, FetchError>>;
}

/// Leaves every field untouched. Used when no media directory is configured.
pub struct PassThrough;

impl FieldPostProcessor for PassThrough {
    fn process<'a>(
        &'a self,
        _field: &'a str,
        _raw: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredAsset>, FetchError>> {
        Box::pin(async { Ok(None) })
    }
}

/// Downloads the designated image field into the media store.
pub struct MediaPostProcessor {
    field: String,
    fetcher: AssetFetcher,
}

impl MediaPostProcessor {
    pub fn new(field: impl Into<String>, fetcher: AssetFetcher) -> Self {
        Self {
            field: field.into(),
            fetcher,
        }
    }
}

impl FieldPostProcessor for MediaPostProcessor {
    fn process<'a>(
        &'a self,
        field: &'a str,
        raw: &'a str,
    ) -> BoxFuture<'a, Result<Option<StoredAsset>, FetchError>> {
        Box::pin(async move {
            // A card without an image is not a failure.
            if field != self.field || raw.trim().is_empty() {
                return Ok(None);
            }
            self.fetcher.fetch(raw).await.map(Some)
        })
    }
}

/// Run `processor` over every named column of `card`.
pub async fn post_process_card(
    mut card: Card,
    schema: &FieldSchema,
    processor: &dyn FieldPostProcessor,
) -> ProcessedCard {
    let mut stored_assets = 0;
    let mut fallbacks = Vec::new();

    for column in 1..card.columns.len() {
        let Some(field) = schema.field_at(column) else {
            continue;
        };
        let result = processor.process(field, &card.columns[column]).await;
        match result {
            Ok(Some(asset)) => {
                card.columns[column] = asset.markup;
                stored_assets += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "Entry #{}: keeping raw '{}' value: {}",
                    card.ordinal, field, e
                );
                fallbacks.push(FieldFallback {
                    field: field.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    ProcessedCard {
        card,
        stored_assets,
        fallbacks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FsMediaStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn schema() -> FieldSchema {
        FieldSchema::new("Entry #", ["Title", "Image"]).with_rich_field("Image")
    }

    fn card(title: &str, image: &str) -> Card {
        Card {
            ordinal: 1,
            line: 1,
            columns: vec!["1".into(), title.into(), image.into()],
        }
    }

    /// Upper-cases titles; fails on images.
    struct Fake;

    impl FieldPostProcessor for Fake {
        fn process<'a>(
            &'a self,
            field: &'a str,
            raw: &'a str,
        ) -> BoxFuture<'a, Result<Option<StoredAsset>, FetchError>> {
            Box::pin(async move {
                match field {
                    "Title" => Ok(Some(StoredAsset {
                        file_name: String::new(),
                        markup: raw.to_uppercase(),
                    })),
                    "Image" => Err(FetchError::Status {
                        url: raw.to_string(),
                        status: 404,
                    }),
                    _ => Ok(None),
                }
            })
        }
    }

    #[test]
    fn pass_through_keeps_everything() {
        let out = tokio_test::block_on(post_process_card(card("t", "i"), &schema(), &PassThrough));
        assert_eq!(out.card.columns, ["1", "t", "i"]);
        assert_eq!(out.stored_assets, 0);
        assert!(out.fallbacks.is_empty());
    }

    #[test]
    fn failure_keeps_raw_text_and_shape() {
        let out = tokio_test::block_on(post_process_card(
            card("t", "https://x.test/a.png"),
            &schema(),
            &Fake,
        ));
        assert_eq!(out.card.columns, ["1", "T", "https://x.test/a.png"]);
        assert_eq!(out.stored_assets, 1);
        assert_eq!(out.fallbacks.len(), 1);
        assert_eq!(out.fallbacks[0].field, "Image");
        assert!(out.fallbacks[0].error.contains("404"));
    }

    #[tokio::test]
    async fn media_processor_ignores_other_fields_and_blanks() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FsMediaStore::new(dir.path()).unwrap());
        let fetcher = AssetFetcher::new(store, 5, "test").unwrap();
        let processor = MediaPostProcessor::new("Image", fetcher);

        assert!(processor.process("Title", "/nope.png").await.unwrap().is_none());
        assert!(processor.process("Image", "  ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn media_processor_missing_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FsMediaStore::new(dir.path()).unwrap());
        let fetcher = AssetFetcher::new(store, 5, "test").unwrap();
        let processor = MediaPostProcessor::new("Image", fetcher);

        let out = post_process_card(card("t", "/no/such/pic.png"), &schema(), &processor).await;
        assert_eq!(out.card.columns, ["1", "t", "/no/such/pic.png"]);
        assert_eq!(out.fallbacks.len(), 1);
    }
}
