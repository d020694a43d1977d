//! Form state for the upload-then-ask workflow.
//!
//! A [`Session`] holds what the user has selected and typed, the latest
//! answer, and one in-flight flag per operation. It is independent of any UI
//! toolkit: a shell reads [`Session::can_upload`] / [`Session::can_ask`] to
//! enable its triggers and renders [`Session::rendered_answer`].
//!
//! ## Concurrency
//!
//! Upload and ask state live behind separate locks and neither lock is held
//! across an `.await`, so both operations can be in flight at once (e.g. via
//! `tokio::join!`). Re-triggering an operation that is already in flight is
//! rejected with [`AskPdfError::Busy`] without a request or a notification,
//! the same as clicking a disabled button.

use crate::client::RagClient;
use crate::document::{Answer, Document, Question, UploadSummary};
use crate::error::{AskPdfError, Operation};
use crate::notify::{NoopNotifier, Notification, SharedNotifier};
use crate::render::render;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Shown in place of an answer until the first one arrives.
pub const ANSWER_PLACEHOLDER: &str = "Ask something to get started!";

pub const MSG_SELECT_PDF: &str = "Select a PDF first!";
pub const MSG_UPLOADED: &str = "PDF Uploaded!";
pub const MSG_UPLOAD_REJECTED: &str = "Failed to upload.";
pub const MSG_UPLOAD_FAILED: &str = "Upload failed.";
pub const MSG_ENTER_QUESTION: &str = "Enter a question!";
pub const MSG_ASK_REJECTED: &str = "Failed to get answer.";
pub const MSG_ASK_FAILED: &str = "Error getting answer.";

#[derive(Default)]
struct UploadState {
    selected: Option<Document>,
    in_flight: bool,
}

#[derive(Default)]
struct AskState {
    question: Question,
    answer: String,
    in_flight: bool,
}

/// Upload/ask workflow state bound to one backend.
pub struct Session {
    client: RagClient,
    notifier: SharedNotifier,
    upload: Mutex<UploadState>,
    ask: Mutex<AskState>,
}

impl Session {
    pub fn new(client: RagClient) -> Self {
        Self {
            client,
            notifier: Arc::new(NoopNotifier),
            upload: Mutex::new(UploadState::default()),
            ask: Mutex::new(AskState::default()),
        }
    }

    /// Route notifications to `notifier` instead of discarding them.
    pub fn with_notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn client(&self) -> &RagClient {
        &self.client
    }

    // ── Form fields ──────────────────────────────────────────────────────

    /// Select the document for the next upload, replacing any previous one.
    pub fn select_document(&self, document: Document) {
        debug!("Selected document: {:?}", document);
        lock(&self.upload).selected = Some(document);
    }

    pub fn clear_document(&self) {
        lock(&self.upload).selected = None;
    }

    pub fn selected_document_name(&self) -> Option<String> {
        lock(&self.upload)
            .selected
            .as_ref()
            .map(|d| d.name().to_string())
    }

    pub fn set_question(&self, question: impl Into<Question>) {
        lock(&self.ask).question = question.into();
    }

    pub fn question(&self) -> Question {
        lock(&self.ask).question.clone()
    }

    /// Latest answer text, empty until the first successful ask.
    pub fn answer(&self) -> String {
        lock(&self.ask).answer.clone()
    }

    /// Latest answer as markup, or the rendered placeholder when there is none.
    pub fn rendered_answer(&self) -> String {
        let answer = self.answer();
        let text = if answer.is_empty() {
            ANSWER_PLACEHOLDER
        } else {
            answer.as_str()
        };
        render(Some(text), self.client.config().render)
    }

    pub fn is_uploading(&self) -> bool {
        lock(&self.upload).in_flight
    }

    pub fn is_asking(&self) -> bool {
        lock(&self.ask).in_flight
    }

    /// Whether the upload trigger should be enabled.
    pub fn can_upload(&self) -> bool {
        let state = lock(&self.upload);
        state.selected.is_some() && !state.in_flight
    }

    /// Whether the ask trigger should be enabled.
    pub fn can_ask(&self) -> bool {
        let state = lock(&self.ask);
        !state.in_flight && !state.question.is_blank()
    }

    // ── Operations ───────────────────────────────────────────────────────

    /// Upload the selected document.
    ///
    /// The document is taken out of the form when the request starts and
    /// dropped once the response arrives, whatever the outcome. Emits exactly
    /// one notification unless the upload is already in flight.
    pub async fn upload(&self) -> Result<UploadSummary, AskPdfError> {
        let document = {
            let mut state = lock(&self.upload);
            if state.in_flight {
                return Err(AskPdfError::Busy {
                    operation: Operation::Upload,
                });
            }
            let taken = state.selected.take();
            let Some(document) = taken else {
                drop(state);
                self.notifier.notify(Notification::error(MSG_SELECT_PDF));
                return Err(AskPdfError::NoDocumentSelected);
            };
            state.in_flight = true;
            document
        };
        let _in_flight = FlagGuard::new(&self.upload, |s: &mut UploadState| s.in_flight = false);

        match self.client.upload_pdf(document).await {
            Ok(summary) => {
                self.notifier.notify(Notification::success(MSG_UPLOADED));
                Ok(summary)
            }
            Err(e) => {
                warn!("Upload failed: {}", e);
                let message = match e {
                    AskPdfError::ServerStatus { .. } => MSG_UPLOAD_REJECTED,
                    _ => MSG_UPLOAD_FAILED,
                };
                self.notifier.notify(Notification::error(message));
                Err(e)
            }
        }
    }

    /// Ask the current question.
    ///
    /// On success the answer replaces the previous one and no notification is
    /// emitted. On failure the previous answer is kept and one error
    /// notification is emitted.
    pub async fn ask(&self) -> Result<Answer, AskPdfError> {
        let question = {
            let mut state = lock(&self.ask);
            if state.in_flight {
                return Err(AskPdfError::Busy {
                    operation: Operation::Ask,
                });
            }
            if state.question.is_blank() {
                drop(state);
                self.notifier.notify(Notification::error(MSG_ENTER_QUESTION));
                return Err(AskPdfError::EmptyQuestion);
            }
            state.in_flight = true;
            state.question.clone()
        };
        let _in_flight = FlagGuard::new(&self.ask, |s: &mut AskState| s.in_flight = false);

        match self.client.ask(&question).await {
            Ok(answer) => {
                lock(&self.ask).answer = answer.answer.clone();
                Ok(answer)
            }
            Err(e) => {
                warn!("Ask failed: {}", e);
                let message = match e {
                    AskPdfError::ServerStatus { .. } => MSG_ASK_REJECTED,
                    _ => MSG_ASK_FAILED,
                };
                self.notifier.notify(Notification::error(message));
                Err(e)
            }
        }
    }

    /// Set the question and ask it.
    pub async fn ask_question(&self, question: impl Into<Question>) -> Result<Answer, AskPdfError> {
        self.set_question(question);
        self.ask().await
    }
}

/// Lock a state mutex, recovering the data if a previous holder panicked.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears an in-flight flag on drop, including when the future is dropped mid-request.
struct FlagGuard<'a, T> {
    state: &'a Mutex<T>,
    clear: fn(&mut T),
}

impl<'a, T> FlagGuard<'a, T> {
    fn new(state: &'a Mutex<T>, clear: fn(&mut T)) -> Self {
        Self { state, clear }
    }
}

impl<T> Drop for FlagGuard<'_, T> {
    fn drop(&mut self) {
        (self.clear)(&mut lock(self.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::notify::CollectingNotifier;

    // Nothing listens here; validation paths must never reach it.
    fn offline_session() -> (Session, Arc<CollectingNotifier>) {
        session_for("http://127.0.0.1:9")
    }

    fn pdf() -> Document {
        Document::from_bytes("a.pdf", b"%PDF-1.7".to_vec()).unwrap()
    }

    #[tokio::test]
    async fn upload_without_document_notifies_once() {
        let (session, notifier) = offline_session();
        let err = session.upload().await.unwrap_err();
        assert!(matches!(err, AskPdfError::NoDocumentSelected));
        assert_eq!(notifier.events(), vec![Notification::error(MSG_SELECT_PDF)]);
        assert!(!session.is_uploading());
    }

    #[tokio::test]
    async fn blank_question_notifies_once() {
        let (session, notifier) = offline_session();
        let err = session.ask_question("   ").await.unwrap_err();
        assert!(matches!(err, AskPdfError::EmptyQuestion));
        assert_eq!(
            notifier.events(),
            vec![Notification::error(MSG_ENTER_QUESTION)]
        );
        assert!(!session.is_asking());
    }

    #[tokio::test]
    async fn upload_in_flight_is_busy_and_silent() {
        let (session, notifier) = offline_session();
        session.select_document(pdf());
        lock(&session.upload).in_flight = true;

        let err = session.upload().await.unwrap_err();
        assert!(matches!(
            err,
            AskPdfError::Busy {
                operation: Operation::Upload
            }
        ));
        assert!(notifier.is_empty());
        // The selection is untouched.
        assert_eq!(session.selected_document_name().as_deref(), Some("a.pdf"));
    }

    #[tokio::test]
    async fn ask_in_flight_is_busy_and_silent() {
        let (session, notifier) = offline_session();
        session.set_question("why?");
        lock(&session.ask).in_flight = true;

        let err = session.ask().await.unwrap_err();
        assert!(matches!(
            err,
            AskPdfError::Busy {
                operation: Operation::Ask
            }
        ));
        assert!(notifier.is_empty());
    }

    fn session_for(base_url: &str) -> (Session, Arc<CollectingNotifier>) {
        let config = ClientConfig::builder().base_url(base_url).build().unwrap();
        let notifier = CollectingNotifier::new();
        let session = Session::new(RagClient::new(config).unwrap()).with_notifier(notifier.clone());
        (session, notifier)
    }

    #[tokio::test]
    async fn double_ask_sends_one_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ask")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"once"}"#)
            .expect(1)
            .create_async()
            .await;
        let (session, notifier) = session_for(&server.url());
        session.set_question("twice?");

        let (first, second) = tokio::join!(session.ask(), session.ask());

        mock.assert_async().await;
        assert_eq!(first.unwrap().text(), "once");
        assert!(matches!(
            second,
            Err(AskPdfError::Busy {
                operation: Operation::Ask
            })
        ));
        assert!(notifier.is_empty());
        assert_eq!(session.answer(), "once");
        assert!(!session.is_asking());
    }

    #[tokio::test]
    async fn double_upload_sends_one_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload-pdf")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let (session, notifier) = session_for(&server.url());
        session.select_document(pdf());

        let (first, second) = tokio::join!(session.upload(), session.upload());

        mock.assert_async().await;
        assert!(first.is_ok());
        assert!(matches!(
            second,
            Err(AskPdfError::Busy {
                operation: Operation::Upload
            })
        ));
        assert_eq!(notifier.events(), vec![Notification::success(MSG_UPLOADED)]);
        assert!(!session.is_uploading());
    }

    #[test]
    fn triggers_follow_form_state() {
        let (session, _) = offline_session();
        assert!(!session.can_upload());
        assert!(!session.can_ask());

        session.select_document(pdf());
        session.set_question("  what is this?  ");
        assert!(session.can_upload());
        assert!(session.can_ask());

        session.set_question(" \t ");
        assert!(!session.can_ask());

        session.clear_document();
        assert!(!session.can_upload());
    }

    #[test]
    fn placeholder_until_first_answer() {
        let (session, _) = offline_session();
        assert_eq!(session.answer(), "");
        assert_eq!(session.rendered_answer(), ANSWER_PLACEHOLDER);
    }

    #[test]
    fn flag_guard_clears_on_drop() {
        let state = Mutex::new(AskState {
            in_flight: true,
            ..AskState::default()
        });
        {
            let _g = FlagGuard::new(&state, |s: &mut AskState| s.in_flight = false);
        }
        assert!(!lock(&state).in_flight);
    }
}
