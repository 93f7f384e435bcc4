//! Network seam: upload form submission, review page fetch and confirm submission.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION},
    multipart, redirect, Client,
};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::upload_intake::{FileSource, SelectedFile};

#[derive(Debug, Clone)]
pub struct UploadForm {
    pub action: String,
    pub field_name: String,
    pub file: SelectedFile,
}

/// Form posted to the confirm endpoint: one `(match_id, selected index)` field per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmForm {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResponse {
    Redirect(String),
    Other(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmResponse {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
}

#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn submit_upload(&self, form: &UploadForm) -> Result<UploadResponse, TransportError>;
    async fn fetch_page(&self, url: &str) -> Result<String, TransportError>;
    async fn submit_confirm(&self, form: &ConfirmForm) -> Result<ConfirmResponse, TransportError>;
}

pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url).map_err(|source| TransportError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        // Redirects are the success signal of an upload, so they must stay observable.
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, target: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(target)
            .map_err(|source| TransportError::InvalidUrl {
                url: target.to_string(),
                source,
            })
    }
}

async fn read_source(file: &SelectedFile) -> Result<Vec<u8>, TransportError> {
    match &file.source {
        FileSource::Bytes(bytes) => Ok(bytes.clone()),
        FileSource::Path(path) => read_path(path).await,
    }
}

async fn read_path(path: &Path) -> Result<Vec<u8>, TransportError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| TransportError::Io {
            context: format!("read staged file {}", path.display()),
            source,
        })
}

pub(crate) fn attachment_filename(disposition: &str) -> Option<String> {
    disposition.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("filename") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn submit_upload(&self, form: &UploadForm) -> Result<UploadResponse, TransportError> {
        let url = self.resolve(&form.action)?;
        let bytes = read_source(&form.file).await?;
        let part = multipart::Part::bytes(bytes)
            .file_name(form.file.name.clone())
            .mime_str(&form.file.media_type)?;
        let body = multipart::Form::new().part(form.field_name.clone(), part);

        info!(url = %url, file = %form.file.name, size = form.file.size, "submitting upload");
        let res = self.http.post(url.clone()).multipart(body).send().await?;
        let status = res.status();

        if status.is_redirection() {
            if let Some(location) = res.headers().get(LOCATION).and_then(|v| v.to_str().ok()) {
                let target = url
                    .join(location)
                    .map_err(|source| TransportError::InvalidUrl {
                        url: location.to_string(),
                        source,
                    })?;
                debug!(status = status.as_u16(), target = %target, "upload redirected");
                return Ok(UploadResponse::Redirect(target.to_string()));
            }
        }

        debug!(status = status.as_u16(), "upload answered without redirect");
        Ok(UploadResponse::Other(status.as_u16()))
    }

    async fn fetch_page(&self, url: &str) -> Result<String, TransportError> {
        let url = self.resolve(url)?;
        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            return Err(TransportError::Status(res.status().as_u16()));
        }
        Ok(res.text().await?)
    }

    async fn submit_confirm(&self, form: &ConfirmForm) -> Result<ConfirmResponse, TransportError> {
        let url = self.resolve(&form.action)?;
        info!(url = %url, fields = form.fields.len(), "submitting confirm form");
        let res = self.http.post(url).form(&form.fields).send().await?;
        if !res.status().is_success() {
            return Err(TransportError::Status(res.status().as_u16()));
        }

        let header = |name: HeaderName| {
            res.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let filename = header(CONTENT_DISPOSITION).and_then(|v| attachment_filename(&v));
        let content_type = header(CONTENT_TYPE);
        let body = res.bytes().await?.to_vec();

        Ok(ConfirmResponse {
            filename,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
