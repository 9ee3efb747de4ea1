use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::tracing;

use crate::error::TransformError;

/// Error codes S3 returns when the caller's credentials or policy reject the
/// request.
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

/// Whole-object reads and writes against a bucket/key namespace.
#[async_trait]
pub(crate) trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, TransformError>;

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransformError>;
}

pub(crate) struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub(crate) fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Builds a client from the Lambda execution environment's credentials
    /// and region.
    pub(crate) async fn from_env() -> Self {
        let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
        tracing::info!(region = ?shared_config.region(), "S3 client initialized");
        Self::new(S3Client::new(&shared_config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, TransformError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if matches!(err.as_service_error(), Some(GetObjectError::NoSuchKey(_)))
                    || err.code() == Some("NoSuchKey")
                {
                    TransformError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    classify(&err, bucket, key)
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| TransformError::Storage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: format!("failed to read object body: {e}"),
            })?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransformError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| classify(&err, bucket, key))?;
        Ok(())
    }
}

fn classify<E>(err: &SdkError<E, HttpResponse>, bucket: &str, key: &str) -> TransformError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(err).to_string();
    if is_access_denied(err) {
        TransformError::Access {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        }
    } else {
        TransformError::Storage {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        }
    }
}

fn is_access_denied<E: ProvideErrorMetadata>(err: &SdkError<E, HttpResponse>) -> bool {
    let denied_code = err
        .code()
        .is_some_and(|code| ACCESS_DENIED_CODES.contains(&code));
    let forbidden_status = err
        .raw_response()
        .is_some_and(|response| response.status().as_u16() == 403);
    denied_code || forbidden_status
}
