use thiserror::Error;

/// Failures while turning one source object into its resized copy.
#[derive(Debug, Error)]
pub(crate) enum TransformError {
    #[error("object s3://{bucket}/{key} does not exist")]
    NotFound { bucket: String, key: String },

    #[error("access denied for s3://{bucket}/{key}: {message}")]
    Access {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("s3://{bucket}/{key} is not a supported image: {source}")]
    Decode {
        bucket: String,
        key: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("storage request for s3://{bucket}/{key} failed: {message}")]
    Storage {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("invalid S3 event record: {0}")]
    InvalidEvent(String),

    #[error("image task did not complete: {0}")]
    Worker(String),
}

impl TransformError {
    /// Whether replaying the invocation unchanged may succeed.
    ///
    /// Only transient storage failures qualify; a missing object, a denied
    /// request or an undecodable payload fails the same way every time.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
