use aws_lambda_events::event::s3::S3EventRecord;

use crate::config::Config;
use crate::error::TransformError;

/// The uploaded object named by one notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceReference {
    pub bucket: String,
    pub key: String,
}

impl SourceReference {
    pub(crate) fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub(crate) fn from_record(record: &S3EventRecord) -> Result<Self, TransformError> {
        let bucket = record
            .s3
            .bucket
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TransformError::InvalidEvent("record has no bucket name".to_string()))?;
        let raw_key = record
            .s3
            .object
            .key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TransformError::InvalidEvent("record has no object key".to_string()))?;
        let key = decode_key(raw_key)?;
        file_name(&key)?;
        Ok(Self::new(bucket, key))
    }
}

/// Final `/`-separated segment of `key`. Folder markers (`a/b/`) have none.
fn file_name(key: &str) -> Result<&str, TransformError> {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(TransformError::InvalidEvent(format!(
            "object key {key:?} has no file name"
        ))),
    }
}

/// Notification keys are form-encoded: `+` is a space, the rest is
/// percent-encoded.
fn decode_key(raw: &str) -> Result<String, TransformError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|e| TransformError::InvalidEvent(format!("object key {raw:?} is not UTF-8: {e}")))
}

/// Where the resized copy of a source object is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DestinationReference {
    pub bucket: String,
    pub key: String,
    pub content_type: &'static str,
}

impl DestinationReference {
    pub(crate) fn derive(
        source: &SourceReference,
        config: &Config,
    ) -> Result<Self, TransformError> {
        let file_name = file_name(&source.key)?;
        let stem = match file_name.rfind('.') {
            Some(dot) if dot > 0 => &file_name[..dot],
            _ => file_name,
        };
        let bucket = config.destination_bucket_for(&source.bucket);
        if bucket == source.bucket && config.destination_prefix.is_empty() {
            // The output would land beside its source and trigger this
            // function again with nothing to tell the two apart.
            return Err(TransformError::InvalidEvent(format!(
                "empty destination prefix would write s3://{}/{} back into its bucket",
                source.bucket, source.key
            )));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key: format!(
                "{}{}.{}",
                config.destination_prefix,
                stem,
                config.output_format.extension()
            ),
            content_type: config.output_format.content_type(),
        })
    }
}

/// True when `source` is itself an output of this function, so processing it
/// would only trigger another notification for the same key.
///
/// An empty prefix never marks an object as output; see
/// [`DestinationReference::derive`] for how that case is rejected.
pub(crate) fn is_own_output(source: &SourceReference, config: &Config) -> bool {
    !config.destination_prefix.is_empty()
        && config.destination_bucket_for(&source.bucket) == source.bucket
        && source.key.starts_with(&config.destination_prefix)
}
