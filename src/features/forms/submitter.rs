//! Form submission through the outbox.
//!
//! Applies the pre-submission gates (confirmation, required fields, one
//! submission per form at a time), runs the request through
//! [`Outbox::submit_or_queue`], and turns the outcome into [`Feedback`], a
//! [`SyncCompleted`] event and a [`Fallback`] page update.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};

use colored::Colorize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::feedback::{succeeded, Feedback, ServerReply, QUEUED_MESSAGE, TIMEOUT_MESSAGE};
use super::form::FormConfig;
use crate::error::VetboxError;
use crate::features::outbox::{DispatchOutcome, HttpResponse, Outbox, RequestBody};

/// Why a submission did not go ahead.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Submission cancelled")]
    Cancelled,

    #[error("Required field missing: {0}")]
    Invalid(String),

    #[error("Form {0} is already being submitted")]
    AlreadySubmitting(String),

    #[error(transparent)]
    Outbox(#[from] VetboxError),
}

/// A yes/no gate before submitting.
pub trait Confirm: Send + Sync {
    /// Ask `message`; `true` means go ahead.
    fn confirm(&self, message: &str) -> bool;
}

/// Answers every question the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

/// Asks on the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{} {} [y/N] ", "?".yellow().bold(), message);
        io::stderr().flush().ok();

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input).is_err() {
            return false;
        }
        matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Emitted once per completed submission.
#[derive(Debug, Clone, Serialize)]
pub struct SyncCompleted {
    pub form: String,
    pub reply: Option<ServerReply>,
    pub response: Option<HttpResponse>,
    pub was_queued: bool,
    pub succeeded: bool,
}

/// Receives [`SyncCompleted`] events.
pub trait SyncListener: Send + Sync {
    /// Handle `event`. Returning `true` claims it and suppresses the
    /// default [`Fallback`].
    fn on_sync(&self, event: &SyncCompleted) -> bool;
}

/// Page update applied when no listener claimed the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Fallback {
    None,
    /// Replace the element at `selector` with `html`.
    ReplaceTarget { selector: String, html: String },
    /// Reload the whole page.
    Reload,
}

/// What one submission produced.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub feedback: Feedback,
    /// `None` when the attempt timed out.
    pub event: Option<SyncCompleted>,
    pub claimed: bool,
    pub fallback: Fallback,
}

/// Releases a form id when its submission ends.
struct InFlight<'a> {
    forms: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.forms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Submits forms through an [`Outbox`].
///
/// A submitter can be shared between threads. Each form id is in flight at
/// most once; a second submission of it fails until the first finishes.
pub struct FormSubmitter<'a> {
    outbox: &'a Outbox,
    confirm: Box<dyn Confirm>,
    listeners: Vec<Box<dyn SyncListener>>,
    on_feedback: Option<Box<dyn Fn(&Feedback) + Send + Sync>>,
    in_flight: Mutex<HashSet<String>>,
}

impl<'a> FormSubmitter<'a> {
    /// A submitter that asks confirmation questions on the terminal.
    #[must_use]
    pub fn new(outbox: &'a Outbox) -> Self {
        Self {
            outbox,
            confirm: Box::new(StdinConfirm),
            listeners: Vec::new(),
            on_feedback: None,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the confirmation gate.
    #[must_use]
    pub fn with_confirm(mut self, confirm: Box<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Register an event listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Box<dyn SyncListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Observe feedback as it changes, starting with [`Feedback::Loading`].
    #[must_use]
    pub fn with_feedback(mut self, observer: Box<dyn Fn(&Feedback) + Send + Sync>) -> Self {
        self.on_feedback = Some(observer);
        self
    }

    fn begin(&self, id: &str) -> Result<InFlight<'_>, SubmissionError> {
        let mut forms = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !forms.insert(id.to_string()) {
            return Err(SubmissionError::AlreadySubmitting(id.to_string()));
        }
        Ok(InFlight {
            forms: &self.in_flight,
            id: id.to_string(),
        })
    }

    fn show(&self, feedback: &Feedback) {
        if let Some(observer) = &self.on_feedback {
            observer(feedback);
        }
    }

    /// Submit `form` with `body`.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::Cancelled`] if the confirmation was declined.
    /// - [`SubmissionError::Invalid`] if a required field is missing.
    /// - [`SubmissionError::AlreadySubmitting`] if this form is in flight.
    /// - [`SubmissionError::Outbox`] if the outbox rejected the request
    ///   outright; a timeout is reported as feedback instead.
    pub fn submit(
        &self,
        form: &FormConfig,
        body: Option<RequestBody>,
    ) -> Result<Submission, SubmissionError> {
        if let Some(question) = &form.confirm {
            if !self.confirm.confirm(question) {
                return Err(SubmissionError::Cancelled);
            }
        }

        if let Some(field) = form.missing_field(body.as_ref()) {
            return Err(SubmissionError::Invalid(field.to_string()));
        }

        let _flight = self.begin(&form.id)?;
        self.show(&Feedback::Loading);

        let request = form.request(body);
        let outcome = match self.outbox.submit_or_queue(request, form.timeout.as_deref()) {
            Ok(outcome) => outcome,
            Err(e) if e.is_timeout() => {
                let feedback = Feedback::Error(TIMEOUT_MESSAGE.to_string());
                self.show(&feedback);
                return Ok(Submission {
                    feedback,
                    event: None,
                    claimed: false,
                    fallback: Fallback::None,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let (feedback, event) = match outcome {
            DispatchOutcome::QueuedOffline => (
                Feedback::Queued(QUEUED_MESSAGE.to_string()),
                SyncCompleted {
                    form: form.id.clone(),
                    reply: None,
                    response: None,
                    was_queued: true,
                    succeeded: false,
                },
            ),
            DispatchOutcome::Delivered(response) => {
                let reply = ServerReply::parse(&response.body);
                let feedback = Feedback::from_response(&response, reply.as_ref());
                let succeeded = succeeded(&response, reply.as_ref());
                (
                    feedback,
                    SyncCompleted {
                        form: form.id.clone(),
                        reply,
                        response: Some(response),
                        was_queued: false,
                        succeeded,
                    },
                )
            }
        };
        self.show(&feedback);

        // Every listener sees the event, even after one has claimed it.
        let claimed = self
            .listeners
            .iter()
            .fold(false, |claimed, listener| listener.on_sync(&event) || claimed);
        let fallback = if claimed {
            Fallback::None
        } else {
            fallback_for(form, &event)
        };
        debug!(form = %form.id, claimed, ?fallback, "submission finished");

        Ok(Submission {
            feedback,
            event: Some(event),
            claimed,
            fallback,
        })
    }
}

/// The default page update for an unclaimed event.
#[must_use]
pub fn fallback_for(form: &FormConfig, event: &SyncCompleted) -> Fallback {
    if event.was_queued {
        return Fallback::None;
    }

    let html = event.reply.as_ref().and_then(|reply| reply.html.clone());
    match (&form.target, html) {
        (Some(selector), Some(html)) => Fallback::ReplaceTarget {
            selector: selector.clone(),
            html,
        },
        _ if event.succeeded && !form.no_reload => Fallback::Reload,
        _ => Fallback::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::outbox::dispatch::MockTransport;
    use crate::features::outbox::{QueueStore, StaticConnectivity, TransportError};
    use crate::storage::MemoryKvStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;

    fn outbox(online: bool, transport: MockTransport) -> Outbox {
        let store = QueueStore::new(Box::new(MemoryKvStore::new()), "q");
        Outbox::new(
            store,
            Box::new(transport),
            Box::new(StaticConnectivity::new(online)),
        )
    }

    fn replying(status: u16, body: &'static str) -> MockTransport {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(move |_, _| Ok(HttpResponse::new(status, body)));
        transport
    }

    struct Claiming(bool, Arc<AtomicUsize>);

    impl SyncListener for Claiming {
        fn on_sync(&self, _event: &SyncCompleted) -> bool {
            self.1.fetch_add(1, Ordering::SeqCst);
            self.0
        }
    }

    #[test]
    fn test_declined_confirmation_sends_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let outbox = outbox(true, transport);
        let submitter = FormSubmitter::new(&outbox).with_confirm(Box::new(AutoConfirm(false)));

        let mut form = FormConfig::new("sale-delete", "/api/sales/3");
        form.confirm = Some("Delete this sale?".to_string());

        assert!(matches!(
            submitter.submit(&form, None),
            Err(SubmissionError::Cancelled)
        ));
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let outbox = outbox(true, transport);
        let submitter = FormSubmitter::new(&outbox);

        let mut form = FormConfig::new("animal", "/animals/new");
        form.required = vec!["name".to_string()];
        let body = RequestBody::Form(vec![("name".to_string(), String::new())]);

        assert!(matches!(
            submitter.submit(&form, Some(body)),
            Err(SubmissionError::Invalid(field)) if field == "name"
        ));
    }

    #[test]
    fn test_double_submit_is_rejected_while_in_flight() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);

        let mut transport = MockTransport::new();
        transport.expect_send().times(2).returning(move |_, _| {
            entered_tx.send(()).ok();
            release_rx.lock().unwrap().recv().ok();
            Ok(HttpResponse::new(200, ""))
        });
        let outbox = outbox(true, transport);
        let submitter = FormSubmitter::new(&outbox);
        let form = FormConfig::new("share", "/api/shares");

        thread::scope(|scope| {
            let first = scope.spawn(|| submitter.submit(&form, None));

            entered_rx.recv().unwrap();
            assert!(matches!(
                submitter.submit(&form, None),
                Err(SubmissionError::AlreadySubmitting(id)) if id == "share"
            ));

            release_tx.send(()).unwrap();
            assert!(first.join().unwrap().is_ok());
        });

        // The guard is released once the submission completes.
        release_tx.send(()).unwrap();
        assert!(submitter.submit(&form, None).is_ok());
    }

    #[test]
    fn test_other_forms_are_not_blocked() {
        let outbox = outbox(true, replying(200, ""));
        let submitter = FormSubmitter::new(&outbox);

        let _held = submitter.begin("share").unwrap();
        let form = FormConfig::new("appointment", "/appointments/new");
        assert!(submitter.submit(&form, None).is_ok());
    }

    #[test]
    fn test_queued_submission_is_neutral_and_never_reloads() {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        let outbox = outbox(false, transport);
        let seen = Arc::new(AtomicUsize::new(0));
        let submitter =
            FormSubmitter::new(&outbox).with_listener(Box::new(Claiming(false, Arc::clone(&seen))));

        let form = FormConfig::new("share", "/api/shares");
        let submission = submitter
            .submit(&form, Some(RequestBody::Json(json!({"tutor_id": 5}))))
            .unwrap();

        assert_eq!(submission.feedback, Feedback::Queued(QUEUED_MESSAGE.to_string()));
        assert!(submission.event.as_ref().is_some_and(|e| e.was_queued));
        assert_eq!(submission.fallback, Fallback::None);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn test_success_reloads_unless_opted_out() {
        let outbox = outbox(true, replying(200, r#"{"success": true, "message": "Booked"}"#));
        let submitter = FormSubmitter::new(&outbox);
        let mut form = FormConfig::new("appointment", "/appointments/new");

        let submission = submitter.submit(&form, None).unwrap();
        assert_eq!(submission.feedback, Feedback::Success("Booked".to_string()));
        assert_eq!(submission.fallback, Fallback::Reload);

        form.no_reload = true;
        let submission = submitter.submit(&form, None).unwrap();
        assert_eq!(submission.fallback, Fallback::None);
    }

    #[test]
    fn test_html_reply_replaces_target() {
        let outbox = outbox(
            true,
            replying(200, r#"{"success": true, "html": "<li>Rex</li>"}"#),
        );
        let submitter = FormSubmitter::new(&outbox);
        let mut form = FormConfig::new("animal", "/animals/new");
        form.target = Some("#animal-list".to_string());

        let submission = submitter.submit(&form, None).unwrap();
        assert_eq!(
            submission.fallback,
            Fallback::ReplaceTarget {
                selector: "#animal-list".to_string(),
                html: "<li>Rex</li>".to_string(),
            }
        );
    }

    #[test]
    fn test_client_error_shows_message_without_reload() {
        let outbox = outbox(
            true,
            replying(400, r#"{"success": false, "message": "Tutor not found"}"#),
        );
        let submitter = FormSubmitter::new(&outbox);
        let form = FormConfig::new("share", "/api/shares");

        let submission = submitter.submit(&form, None).unwrap();
        assert_eq!(submission.feedback, Feedback::Error("Tutor not found".to_string()));
        assert!(!submission.event.as_ref().is_some_and(|e| e.succeeded));
        assert_eq!(submission.fallback, Fallback::None);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_claimed_event_suppresses_fallback() {
        let outbox = outbox(true, replying(200, "{}"));
        let seen = Arc::new(AtomicUsize::new(0));
        let submitter = FormSubmitter::new(&outbox)
            .with_listener(Box::new(Claiming(true, Arc::clone(&seen))))
            .with_listener(Box::new(Claiming(false, Arc::clone(&seen))));
        let form = FormConfig::new("note", "/notes");

        let submission = submitter.submit(&form, None).unwrap();
        assert!(submission.claimed);
        assert_eq!(submission.fallback, Fallback::None);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_timeout_asks_for_retry() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_, timeout| Err(TransportError::Timeout(timeout.unwrap_or_default())));
        let outbox = outbox(true, transport);
        let shown = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&shown);
        let submitter = FormSubmitter::new(&outbox).with_feedback(Box::new(
            move |feedback: &Feedback| log.lock().unwrap().push(feedback.clone()),
        ));
        let form = FormConfig::new("appointment", "/appointments/new");

        let submission = submitter.submit(&form, None).unwrap();
        assert_eq!(submission.feedback, Feedback::Error(TIMEOUT_MESSAGE.to_string()));
        assert!(submission.event.is_none());
        assert!(outbox.is_empty());
        assert_eq!(
            *shown.lock().unwrap(),
            vec![Feedback::Loading, Feedback::Error(TIMEOUT_MESSAGE.to_string())]
        );
    }

    #[test]
    fn test_auth_form_cannot_be_queued() {
        let outbox = outbox(false, MockTransport::new());
        let submitter = FormSubmitter::new(&outbox);
        let form = FormConfig::new("login", "/login");

        assert!(matches!(
            submitter.submit(&form, None),
            Err(SubmissionError::Outbox(VetboxError::NotQueueable(_)))
        ));
    }
}
