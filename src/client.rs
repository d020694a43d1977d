//! HTTP client for the two backend routes.
//!
//! Both calls are a single multipart `POST` with no retry: a failed upload or
//! question is reported once and the user decides whether to try again.
//!
//! ```text
//! upload_pdf ──▶ POST {base}/upload-pdf   file=<pdf bytes>   → any 2xx
//! ask        ──▶ POST {base}/ask          question=<text>    → 2xx {"answer": "..."}
//! ```

use crate::config::ClientConfig;
use crate::document::{Answer, Document, Question, UploadSummary, PDF_MEDIA_TYPE};
use crate::error::AskPdfError;
use reqwest::multipart::{Form, Part};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest slice of an error body kept in [`AskPdfError::ServerStatus`].
const MAX_ERROR_BODY: usize = 200;

/// Client for a RAG backend exposing `/upload-pdf` and `/ask`.
///
/// Cheap to clone: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct RagClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl RagClient {
    /// Build a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self, AskPdfError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AskPdfError::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a document to the upload route.
    ///
    /// Any 2xx status is a success. The response body is parsed on a
    /// best-effort basis into an [`UploadSummary`]; a body that does not parse
    /// yields an empty summary, not an error.
    pub async fn upload_pdf(&self, document: Document) -> Result<UploadSummary, AskPdfError> {
        let endpoint = self.config.upload_url();
        let (name, bytes) = document.into_parts();
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(name.clone())
            .mime_str(PDF_MEDIA_TYPE)
            .map_err(|e| AskPdfError::Internal(format!("Invalid media type: {e}")))?;
        let form = Form::new().part(self.config.file_field.clone(), part);

        info!("Uploading '{}' ({} bytes) to {}", name, size, endpoint);
        let start = Instant::now();

        let response = self
            .http
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error(&endpoint, e))?;

        let response = self.check_status(&endpoint, response).await?;

        let summary = match response.text().await {
            Ok(body) => serde_json::from_str::<UploadSummary>(&body).unwrap_or_else(|e| {
                debug!("Upload response is not a summary: {}", e);
                UploadSummary::default()
            }),
            Err(e) => {
                debug!("Could not read upload response body: {}", e);
                UploadSummary::default()
            }
        };

        info!(
            "Upload of '{}' accepted in {}ms (chunks: {:?})",
            name,
            start.elapsed().as_millis(),
            summary.chunks
        );
        Ok(summary)
    }

    /// Ask a question and return the backend's answer.
    ///
    /// The question is sent verbatim, whitespace included.
    pub async fn ask(&self, question: &Question) -> Result<Answer, AskPdfError> {
        let endpoint = self.config.ask_url();
        let form = Form::new().text(
            self.config.question_field.clone(),
            question.as_str().to_string(),
        );

        info!("Asking {} ({} chars)", endpoint, question.as_str().len());
        let start = Instant::now();

        let response = self
            .http
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error(&endpoint, e))?;

        let response = self.check_status(&endpoint, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| self.send_error(&endpoint, e))?;

        let answer: Answer =
            serde_json::from_str(&body).map_err(|e| AskPdfError::InvalidResponse {
                endpoint: endpoint.clone(),
                detail: e.to_string(),
            })?;

        info!(
            "Answer received in {}ms ({} chars)",
            start.elapsed().as_millis(),
            answer.answer.len()
        );
        Ok(answer)
    }

    /// Turn a non-2xx response into [`AskPdfError::ServerStatus`].
    async fn check_status(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AskPdfError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("{} returned HTTP {}", endpoint, status);

        Err(AskPdfError::ServerStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        })
    }

    fn send_error(&self, endpoint: &str, e: reqwest::Error) -> AskPdfError {
        if e.is_timeout() {
            AskPdfError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.config.timeout_secs.unwrap_or_default(),
            }
        } else {
            AskPdfError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}\u{2026}")
    } else {
        head
    }
}
