//! Configuration for the RAG backend client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The defaults describe the reference backend: a
//! FastAPI server on `http://localhost:8000` with `/upload-pdf` and `/ask`
//! routes taking multipart form fields `file` and `question`.

use crate::error::AskPdfError;
use crate::render::RenderOptions;
use serde::{Deserialize, Serialize};

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for a [`crate::client::RagClient`].
///
/// # Example
/// ```rust
/// use edgequake_askpdf::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://rag.internal:8000/")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://rag.internal:8000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend address without trailing slash. Default: `http://localhost:8000`.
    pub base_url: String,

    /// Route receiving the PDF. Default: `/upload-pdf`.
    pub upload_path: String,

    /// Route answering questions. Default: `/ask`.
    pub ask_path: String,

    /// Multipart field carrying the PDF. Default: `file`.
    pub file_field: String,

    /// Multipart field carrying the question. Default: `question`.
    pub question_field: String,

    /// Per-request timeout in seconds. Default: None.
    ///
    /// Answering a question means an embedding call plus an LLM completion on
    /// the backend, which can take a while on large documents. With `None`
    /// only the network stack's own timeouts apply.
    pub timeout_secs: Option<u64>,

    /// How answers are rendered into markup.
    pub render: RenderOptions,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_path: "/upload-pdf".to_string(),
            ask_path: "/ask".to_string(),
            file_field: "file".to_string(),
            question_field: "question".to_string(),
            timeout_secs: None,
            render: RenderOptions::default(),
            user_agent: concat!("askpdf/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the upload route.
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, self.upload_path)
    }

    /// Full URL of the ask route.
    pub fn ask_url(&self) -> String {
        format!("{}{}", self.base_url, self.ask_path)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn upload_path(mut self, path: impl Into<String>) -> Self {
        self.config.upload_path = normalise_path(path.into());
        self
    }

    pub fn ask_path(mut self, path: impl Into<String>) -> Self {
        self.config.ask_path = normalise_path(path.into());
        self
    }

    pub fn file_field(mut self, name: impl Into<String>) -> Self {
        self.config.file_field = name.into();
        self
    }

    pub fn question_field(mut self, name: impl Into<String>) -> Self {
        self.config.question_field = name.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn escape_html(mut self, v: bool) -> Self {
        self.config.render.escape_html = v;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, AskPdfError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(AskPdfError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if reqwest::Url::parse(&c.base_url).is_err() {
            return Err(AskPdfError::InvalidConfig(format!(
                "base URL is not a valid URL: '{}'",
                c.base_url
            )));
        }
        if c.file_field.is_empty() || c.question_field.is_empty() {
            return Err(AskPdfError::InvalidConfig(
                "multipart field names must not be empty".into(),
            ));
        }
        if c.timeout_secs == Some(0) {
            return Err(AskPdfError::InvalidConfig(
                "timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

fn normalise_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
