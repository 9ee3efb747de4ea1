use lambda_runtime::tracing;
use serde::Serialize;

use crate::config::Config;
use crate::error::TransformError;
use crate::object_ref::{is_own_output, DestinationReference, SourceReference};
use crate::pipeline::{self, ImagePipeline};
use crate::storage::ObjectStore;

/// The value returned to the Lambda runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProcessingResult {
    pub status_code: u16,
    pub body: String,
}

impl ProcessingResult {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }
}

/// Fetches one uploaded image, shrinks it and stores the result.
pub(crate) struct ImageTransformer<'a, S> {
    store: &'a S,
    config: &'a Config,
    pipeline: ImagePipeline,
}

impl<'a, S: ObjectStore> ImageTransformer<'a, S> {
    pub(crate) fn new(store: &'a S, config: &'a Config) -> Self {
        Self {
            store,
            config,
            pipeline: ImagePipeline::from_config(config),
        }
    }

    pub(crate) async fn process(
        &self,
        source: &SourceReference,
    ) -> Result<ProcessingResult, TransformError> {
        if is_own_output(source, self.config) {
            tracing::info!(
                bucket = %source.bucket,
                key = %source.key,
                "skipping object under the destination prefix"
            );
            return Ok(ProcessingResult::ok(format!("skipped {}", source.key)));
        }
        let destination = DestinationReference::derive(source, self.config)?;

        let original = self.store.get(&source.bucket, &source.key).await?;
        tracing::info!(
            bucket = %source.bucket,
            key = %source.key,
            size = original.len(),
            "fetched source object"
        );

        let image_pipeline = self.pipeline;
        let decode_source = source.clone();
        let encoded = run_blocking(move || {
            let decoded = pipeline::decode(&original).map_err(|e| TransformError::Decode {
                bucket: decode_source.bucket,
                key: decode_source.key,
                source: e,
            })?;
            image_pipeline.resize_and_encode(decoded)
        })
        .await?;

        let (width, height, size) = (encoded.width, encoded.height, encoded.bytes.len());
        self.store
            .put(
                &destination.bucket,
                &destination.key,
                encoded.bytes,
                destination.content_type,
            )
            .await?;
        tracing::info!(
            bucket = %destination.bucket,
            key = %destination.key,
            width,
            height,
            size,
            "stored resized image"
        );

        Ok(ProcessingResult::ok(format!("processed {}", source.key)))
    }
}

/// Runs CPU-bound work on tokio's blocking pool. A panic in `work` surfaces
/// as [`TransformError::Worker`].
async fn run_blocking<T, F>(work: F) -> Result<T, TransformError>
where
    F: FnOnce() -> Result<T, TransformError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| TransformError::Worker(e.to_string()))?
}
