//! Function configuration, read once per process from `RESIZE_*` variables.

use serde::Deserialize;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "RESIZE_";

/// Largest width or height libwebp will encode.
const WEBP_MAX_DIMENSION: u32 = 16383;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    #[default]
    Webp,
    Jpeg,
}

impl OutputFormat {
    pub(crate) fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
        }
    }

    pub(crate) fn content_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Config {
    /// Bucket receiving resized images. Unset means the source bucket.
    #[serde(default)]
    pub destination_bucket: Option<String>,
    /// Prepended to every destination key.
    #[serde(default = "default_destination_prefix")]
    pub destination_prefix: String,
    /// Upper bound for both width and height, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Encoder quality, 1-100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_destination_prefix() -> String {
    "processed/".to_string()
}

fn default_max_dimension() -> u32 {
    800
}

fn default_quality() -> u8 {
    80
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination_bucket: None,
            destination_prefix: default_destination_prefix(),
            max_dimension: default_max_dimension(),
            output_format: OutputFormat::default(),
            quality: default_quality(),
        }
    }
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub(crate) fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dimension == 0 {
            return Err(ConfigError::Invalid(
                "max_dimension must be at least 1".to_string(),
            ));
        }
        if self.output_format == OutputFormat::Webp && self.max_dimension > WEBP_MAX_DIMENSION {
            return Err(ConfigError::Invalid(format!(
                "max_dimension must be at most {WEBP_MAX_DIMENSION} for webp output, got {}",
                self.max_dimension
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Invalid(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        match self.destination_bucket.as_deref() {
            Some("") => {
                return Err(ConfigError::Invalid(
                    "destination_bucket must not be empty when set".to_string(),
                ))
            }
            // Writing back into the source bucket without a prefix would
            // make every output indistinguishable from a fresh upload.
            None if self.destination_prefix.is_empty() => {
                return Err(ConfigError::Invalid(
                    "destination_prefix is required when destination_bucket is unset".to_string(),
                ))
            }
            _ => {}
        }
        Ok(())
    }

    /// Bucket the output for an object from `source_bucket` is written to.
    pub(crate) fn destination_bucket_for<'a>(&'a self, source_bucket: &'a str) -> &'a str {
        self.destination_bucket.as_deref().unwrap_or(source_bucket)
    }
}
