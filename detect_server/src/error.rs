//! Error types of the detection pipeline.
//!
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// The model artifact could not be turned into a runnable model.
///
/// Fatal for the process: nothing retries a failed load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("model file {path} not found")]
    Missing { path: PathBuf },

    #[error("model file {path} could not be loaded: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Retrieving a remote image failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid image URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(StatusCode),

    #[error("image is larger than the limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("URL points to a web page ({content_type}), not to an image")]
    NotAnImage { content_type: String },
}

/// Bytes could not be turned into an image.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported image format {0}, expected JPG, JPEG, PNG, BMP or WEBP")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// The inference backend rejected the input or produced an unusable output.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference failed: {0}")]
    Backend(#[source] anyhow::Error),

    #[error("model produced an empty output")]
    EmptyOutput,

    #[error("model produced an invalid prediction {0}")]
    InvalidPrediction(f32),
}

/// Producing an image from any source failed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Anything that can go wrong while serving one classification request.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<FetchError> for ClassifyError {
    fn from(err: FetchError) -> Self {
        ClassifyError::Source(err.into())
    }
}

impl From<DecodeError> for ClassifyError {
    fn from(err: DecodeError) -> Self {
        ClassifyError::Source(err.into())
    }
}

impl SourceError {
    /// Message that is safe to show to users.
    ///
    /// Decode failures are reported generically, their details only go to the log.
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Fetch(err @ FetchError::NotAnImage { .. }) => format!(
                "{err}. Use the direct address of the image (right click the image, copy image address)"
            ),
            SourceError::Fetch(err) => format!("Could not load the image from the URL: {err}"),
            SourceError::Decode(err @ DecodeError::UnsupportedFormat(_)) => err.to_string(),
            SourceError::Decode(DecodeError::Image(_)) => {
                "Could not process the image. Try a direct image link (ending in .jpg, .png, .webp...)"
                    .to_owned()
            }
        }
    }
}
