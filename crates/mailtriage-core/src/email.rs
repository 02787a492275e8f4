//! Email content model.

use serde::{Deserialize, Serialize};

/// An incoming email under triage. Created once per run, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailContent {
    /// The email subject
    pub subject: String,
    /// The email body content
    pub body: String,
    /// The email sender address
    pub sender: String,
}

impl EmailContent {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
        }
    }
}
