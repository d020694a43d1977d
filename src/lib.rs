//! # edgequake-askpdf
//!
//! Upload a PDF to a retrieval-augmented-generation (RAG) backend and ask
//! questions about it.
//!
//! ## What lives where
//!
//! The backend does all the heavy lifting: text extraction, chunking,
//! embeddings, vector search and the LLM call. This crate is the client side:
//!
//! ```text
//! PDF ──▶ Document ──▶ POST /upload-pdf            (client::upload_pdf)
//! text ─▶ Question ──▶ POST /ask ──▶ {"answer"}     (client::ask)
//!                                       │
//!                                       └──▶ render ──▶ markup
//! ```
//!
//! - [`mod@render`]: the Markdown subset renderer used to display answers
//! - [`client`]: [`RagClient`], one multipart `POST` per operation, no retry
//! - [`session`]: [`Session`], the form state a UI binds to (selected file,
//!   question, answer, in-flight flags, notifications)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_askpdf::{ClientConfig, Document, RagClient, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RagClient::new(ClientConfig::default())?;
//!     let session = Session::new(client);
//!
//!     session.select_document(Document::from_path("paper.pdf").await?);
//!     session.upload().await?;
//!
//!     session.ask_question("What is the main contribution?").await?;
//!     println!("{}", session.rendered_answer());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `askpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod notify;
pub mod render;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::RagClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use document::{Answer, Document, Question, UploadSummary};
pub use error::{AskPdfError, ErrorKind, Operation};
pub use notify::{CollectingNotifier, Level, NoopNotifier, Notification, Notifier, SharedNotifier};
pub use render::{render, render_markdown, RenderOptions};
pub use session::{Session, ANSWER_PLACEHOLDER};
