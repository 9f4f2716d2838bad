//! Retrieval of remote images.
//!
use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    redirect, Client, Url,
};

use crate::error::FetchError;

/// Default time after which a remote image request is abandoned.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Largest accepted image, for uploads and remote images alike.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Maximum number of redirects followed for one request.
const MAX_REDIRECTS: usize = 10;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// HTTP client downloading images the way a browser would request them.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
    max_bytes: usize,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    /// Limit the size of downloaded bodies to `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Download the body of `url`.
    ///
    /// Responses announcing an HTML document are rejected before their body is read. Bodies
    /// larger than the size limit are rejected up front when announced, else while reading.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let url = parse_image_url(url)?;
        log::info!("Fetching image from {}", &url);

        let mut request = self.client.get(url.clone());
        if let Ok(referer) = HeaderValue::from_str(url.as_str()) {
            request = request.header(header::REFERER, referer);
        }

        let mut resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        check_content_type(
            resp.headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        )?;

        let limit = self.max_bytes;
        if let Some(len) = resp.content_length() {
            if len > limit as u64 {
                return Err(FetchError::TooLarge { limit });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        log::debug!("Fetched {} bytes from {}", body.len(), &url);

        Ok(body.into())
    }
}

fn parse_image_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|err| FetchError::InvalidUrl {
        url: url.to_owned(),
        reason: err.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}

/// Reject content types of web pages.
///
/// A missing content type is accepted and left to the decoder.
pub fn check_content_type(content_type: Option<&str>) -> Result<(), FetchError> {
    match content_type {
        Some(content_type) if content_type.to_ascii_lowercase().contains("text/html") => {
            Err(FetchError::NotAnImage {
                content_type: content_type.to_owned(),
            })
        }
        _ => Ok(()),
    }
}
