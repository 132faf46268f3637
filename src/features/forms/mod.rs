//! Form interception.
//!
//! Turns a form submission into an outbox request and the outcome into
//! feedback, a completion event and the default page update.

pub mod feedback;
pub mod form;
pub mod submitter;

pub use feedback::{Feedback, ServerReply};
pub use form::FormConfig;
pub use submitter::{
    fallback_for, AutoConfirm, Confirm, Fallback, FormSubmitter, StdinConfirm, Submission,
    SubmissionError, SyncCompleted, SyncListener,
};
