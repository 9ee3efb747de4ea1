use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{tracing, Error, LambdaEvent};

use crate::config::Config;
use crate::error::TransformError;
use crate::object_ref::SourceReference;
use crate::storage::ObjectStore;
use crate::transformer::{ImageTransformer, ProcessingResult};

fn source_references(event: &S3Event) -> Result<Vec<SourceReference>, TransformError> {
    event
        .records
        .iter()
        .map(SourceReference::from_record)
        .collect()
}

pub(crate) async fn function_handler<S: ObjectStore>(
    event: LambdaEvent<S3Event>,
    store: &S,
    config: &Config,
) -> Result<ProcessingResult, Error> {
    let payload = event.payload;
    if payload.records.is_empty() {
        tracing::warn!("No records found in S3 event");
        return Ok(ProcessingResult::ok("no records to process"));
    }

    let sources = source_references(&payload).inspect_err(|e| {
        tracing::error!(error = %e, "Rejecting S3 event");
    })?;

    let transformer = ImageTransformer::new(store, config);
    let mut bodies = Vec::with_capacity(sources.len());
    for source in &sources {
        let result = transformer.process(source).await.inspect_err(|e| {
            tracing::error!(
                bucket = %source.bucket,
                key = %source.key,
                retryable = e.is_retryable(),
                error = %e,
                "Failed to process object"
            );
        })?;
        bodies.push(result.body);
    }
    tracing::info!(records = sources.len(), "Processed S3 event");
    Ok(ProcessingResult::ok(bodies.join("; ")))
}
