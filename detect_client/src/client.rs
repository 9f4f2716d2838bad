//! HTTP client of the classify endpoints.
//!
use std::path::Path;

use anyhow::{anyhow, Result};
use common::protocol::{ClassifyResponse, ClassifyUrlReq, ErrorResponse};
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};

/// Connection to one detection server.
pub struct DetectClient {
    client: Client,
    base_url: String,
}

impl DetectClient {
    /// Create a client for the server listening on `address` (`host:port`).
    pub fn new(address: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("http://{address}"),
        }
    }

    /// Upload an image file.
    pub async fn classify_file(&self, path: impl AsRef<Path>) -> Result<ClassifyResponse> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mut part = Part::bytes(bytes);
        if let Some(name) = path.file_name() {
            part = part.file_name(name.to_string_lossy().into_owned());
        }
        log::info!("Uploading {}", path.display());

        self.post_form(Form::new().part("image", part)).await
    }

    /// Upload a frame captured by a camera.
    pub async fn classify_camera_frame(&self, frame: Vec<u8>) -> Result<ClassifyResponse> {
        log::info!("Uploading camera frame ({} bytes)", frame.len());
        self.post_form(Form::new().part("camera", Part::bytes(frame))).await
    }

    /// Let the server fetch and classify a remote image.
    pub async fn classify_url(&self, url: &str) -> Result<ClassifyResponse> {
        let resp = self
            .client
            .post(format!("{}/classify_url", &self.base_url))
            .json(&ClassifyUrlReq {
                url: url.to_owned(),
            })
            .send()
            .await?;

        parse_response(resp).await
    }

    async fn post_form(&self, form: Form) -> Result<ClassifyResponse> {
        let resp = self
            .client
            .post(format!("{}/classify", &self.base_url))
            .multipart(form)
            .send()
            .await?;

        parse_response(resp).await
    }
}

async fn parse_response(resp: Response) -> Result<ClassifyResponse> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => "no error details".to_owned(),
    };

    Err(anyhow!("server answered {status}: {message}"))
}
