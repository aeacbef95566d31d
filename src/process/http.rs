//! HTTP implementation of [`ImageProcessor`] — multipart `POST {api}/process`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::{ImageProcessor, ProcessError, ProcessRequest, ProcessorConfig, describe_error_payload};

pub struct HttpProcessor {
    http: reqwest::Client,
    process_url: String,
}

impl HttpProcessor {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::HttpClientBuild`] if the reqwest client cannot be built.
    pub fn new(config: &ProcessorConfig) -> Result<Self, ProcessError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ProcessError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, process_url: config.process_url() })
    }

    #[must_use]
    pub fn process_url(&self) -> &str {
        &self.process_url
    }
}

#[async_trait]
impl ImageProcessor for HttpProcessor {
    async fn process(&self, request: ProcessRequest) -> Result<Bytes, ProcessError> {
        let form = build_form(&request)?;
        debug!(
            url = %self.process_url,
            preview = request.is_preview,
            format = %request.format,
            upload_bytes = request.image.byte_size(),
            "sending process request"
        );

        let response = self
            .http
            .post(&self.process_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProcessError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProcessError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProcessError::Server { status: status.as_u16(), message: describe_error_payload(&body) });
        }
        Ok(body)
    }
}

fn build_form(request: &ProcessRequest) -> Result<Form, ProcessError> {
    let image = &request.image;
    let part = Part::stream_with_length(image.bytes().clone(), image.byte_size() as u64)
        .file_name(image.name().to_string())
        .mime_str(image.mime_type())
        .map_err(|e| ProcessError::Transport(format!("invalid image mime type: {e}")))?;

    let form = request
        .form_fields()
        .into_iter()
        .fold(Form::new().part("image", part), |form, (name, value)| form.text(name, value));
    Ok(form)
}
