//! Data model: the document being uploaded, the question, and the answer.
//!
//! A [`Document`] is held fully in memory. The backend receives the bytes as a
//! multipart file part, so there is no reason to keep a path around once the
//! file has been read. We validate the PDF magic bytes (`%PDF`) at selection
//! time so a wrong file is reported before anything goes over the wire.

use crate::error::AskPdfError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Media type sent with every uploaded document.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

const PDF_MAGIC: &[u8; 4] = b"%PDF";
const FALLBACK_NAME: &str = "document.pdf";

/// A PDF selected by the user, held in memory until it is submitted.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Document {
    /// Wrap in-memory bytes, validating the PDF magic.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AskPdfError> {
        let name = name.into();
        let name = if name.trim().is_empty() {
            FALLBACK_NAME.to_string()
        } else {
            name
        };
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(AskPdfError::NotAPdf {
                name,
                magic: bytes.iter().take(4).copied().collect(),
            });
        }
        Ok(Self { name, bytes })
    }

    /// Read a local file into memory.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AskPdfError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            IoErrorKind::PermissionDenied => AskPdfError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => AskPdfError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(FALLBACK_NAME);

        debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(name, bytes)
    }

    /// Resolve a user-supplied path or HTTP/HTTPS URL to a document.
    ///
    /// URLs are downloaded with the given timeout; everything else is treated
    /// as a local path.
    pub async fn resolve(input: &str, timeout_secs: Option<u64>) -> Result<Self, AskPdfError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AskPdfError::InvalidInput {
                input: input.to_string(),
            });
        }
        if is_url(input) {
            download_url(input, timeout_secs).await
        } else {
            Self::from_path(input).await
        }
    }

    /// File name sent as the multipart part's filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw PDF content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Always [`PDF_MEDIA_TYPE`].
    pub fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<u8>) {
        (self.name, self.bytes)
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

async fn download_url(url: &str, timeout_secs: Option<u64>) -> Result<Document, AskPdfError> {
    info!("Downloading PDF from: {}", url);

    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().map_err(|e| AskPdfError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AskPdfError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs.unwrap_or_default(),
            }
        } else {
            AskPdfError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AskPdfError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AskPdfError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Document::from_bytes(filename_from_url(url), bytes.to_vec())
}

/// Last non-empty path segment that looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    FALLBACK_NAME.to_string()
}

/// A question typed by the user. Sent verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the question is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for Question {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Question {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Body of a successful `/ask` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
}

impl Answer {
    pub fn text(&self) -> &str {
        &self.answer
    }
}

/// Best-effort view of a successful `/upload-pdf` response body.
///
/// Every field is optional; a backend that returns nothing, or something
/// else entirely, still counts as a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(default)]
    pub message: Option<String>,
    /// Number of text chunks the backend indexed.
    #[serde(default)]
    pub chunks: Option<u64>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}
