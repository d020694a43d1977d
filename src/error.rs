//! Error types for the edgequake-askpdf library.
//!
//! Every operation returns [`AskPdfError`]. The variants fall into the three
//! families a user actually sees, exposed through [`AskPdfError::kind`]:
//!
//! * **Validation**: caught before any network call (no document selected,
//!   blank question, trigger already in flight).
//! * **Transport**: the request never produced an HTTP status (connection
//!   refused, DNS failure, timeout, unreadable body).
//! * **Server**: the backend answered with a non-2xx status.
//!
//! Input errors (missing file, not a PDF) are reported separately because they
//! happen while *selecting* a document, not while submitting it.
//!
//! None of these are retried. The [`crate::session::Session`] turns each one
//! into exactly one transient notification and leaves prior state untouched.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-askpdf library.
#[derive(Debug, Error)]
pub enum AskPdfError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Upload was triggered with no document selected.
    #[error("No PDF selected. Select a PDF before uploading.")]
    NoDocumentSelected,

    /// Ask was triggered with an empty or whitespace-only question.
    #[error("Question is empty. Type a question before asking.")]
    EmptyQuestion,

    /// The operation's trigger is disabled because a previous request is still in flight.
    #[error("{operation} is already in progress")]
    Busy { operation: Operation },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The document was read, but is not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The request could not be delivered or its response could not be read.
    #[error("Request to '{endpoint}' failed: {reason}\nIs the backend running?")]
    Transport { endpoint: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// The backend answered with a non-2xx status.
    #[error("Backend returned HTTP {status} for '{endpoint}': {body}")]
    ServerStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A 2xx response whose body is not the expected JSON shape.
    #[error("Unexpected response from '{endpoint}': {detail}")]
    InvalidResponse { endpoint: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The two user-triggered backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    Upload,
    Ask,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Upload => f.write_str("Upload"),
            Operation::Ask => f.write_str("Ask"),
        }
    }
}

/// Coarse classification of an [`AskPdfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any network call.
    Validation,
    /// Selecting or reading the document failed.
    Input,
    /// No HTTP status was obtained, or the body was unreadable.
    Transport,
    /// The backend returned a non-2xx status.
    Server,
    /// Misconfiguration or a bug.
    Internal,
}

impl AskPdfError {
    /// Classify this error into the family shown to the user.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AskPdfError::NoDocumentSelected
            | AskPdfError::EmptyQuestion
            | AskPdfError::Busy { .. } => ErrorKind::Validation,
            AskPdfError::FileNotFound { .. }
            | AskPdfError::PermissionDenied { .. }
            | AskPdfError::InvalidInput { .. }
            | AskPdfError::NotAPdf { .. }
            | AskPdfError::DownloadFailed { .. }
            | AskPdfError::DownloadTimeout { .. } => ErrorKind::Input,
            AskPdfError::Transport { .. }
            | AskPdfError::Timeout { .. }
            | AskPdfError::InvalidResponse { .. } => ErrorKind::Transport,
            AskPdfError::ServerStatus { .. } => ErrorKind::Server,
            AskPdfError::InvalidConfig(_) | AskPdfError::Internal(_) => ErrorKind::Internal,
        }
    }
}
