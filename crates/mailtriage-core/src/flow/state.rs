//! Mutable run state for a single triage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::email::EmailContent;

/// State of one triage run, owned exclusively by its flow.
///
/// `email` must be set before the first step executes. Every other field is
/// populated monotonically as steps complete and is never read before its
/// producing step has run on the taken branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageState {
    /// Unique id of this run, for logs and diagnostics
    pub run_id: String,

    /// When the run state was created
    pub created_at: DateTime<Utc>,

    /// The email under triage
    pub email: Option<EmailContent>,

    /// Raw analysis output plus any parsed fields
    pub analysis_results: Option<Map<String, Value>>,

    /// Knowledge retrieval output (branch A only)
    pub retrieved_info: Option<Map<String, Value>>,

    /// Drafted general answer (branch A only)
    pub created_response: Option<Map<String, Value>>,

    /// Summary text; empty until a summarization step ran
    #[serde(default)]
    pub email_summary: String,

    /// Terminal artifact bundle for human handoff
    pub final_materials: Option<Map<String, Value>>,

    /// Whether a general-knowledge answer can be prepared
    #[serde(default)]
    pub can_prepare_info: bool,
}

impl TriageState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            email: None,
            analysis_results: None,
            retrieved_info: None,
            created_response: None,
            email_summary: String::new(),
            final_materials: None,
            can_prepare_info: false,
        }
    }

    pub fn with_email(email: EmailContent) -> Self {
        let mut state = Self::new();
        state.email = Some(email);
        state
    }
}

impl Default for TriageState {
    fn default() -> Self {
        Self::new()
    }
}
