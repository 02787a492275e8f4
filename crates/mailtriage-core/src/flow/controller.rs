//! Flow controller — drives a triage run from start to handoff.
//!
//! The step order is fixed with one branch point:
//!
//! ```text
//! START ─► ANALYZE_INTENT ─► DECIDE ─┬─► RETRIEVE_INFO ─► DRAFT_ANSWER ─► SUMMARIZE_FROM_ANSWER ─┐
//!                                    └─► SUMMARIZE_FROM_EMAIL ──────────────────────────────────┤
//!                                                                                               ▼
//!                                                                            PREPARE_FINAL_MATERIAL
//! ```
//!
//! Failure handling is deliberately asymmetric and must stay that way:
//! analysis, retrieval, drafting, and final preparation abort the run on
//! failure (after writing an error placeholder into the state), while the
//! two summarization steps swallow failures and substitute a literal
//! failure string so the run always reaches the human-handoff step.

use serde_json::{Map, Value};

use crate::email::EmailContent;
use crate::error::TriageError;
use crate::executor::StepBackend;
use crate::extract::flag_is_true;
use crate::step::{ContextValue, StepContext, StepId};

use super::state::TriageState;

/// Outcome of the branch evaluation after intent analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A general-knowledge answer can be prepared
    CanPrepareInfo,
    /// Hand the email to a human with only a summary
    CannotPrepareInfo,
}

/// Drives one triage run. Owns the run state; concurrent runs each get
/// their own flow and backend instance.
pub struct TriageFlow<B: StepBackend> {
    backend: B,
    state: TriageState,
}

impl<B: StepBackend> TriageFlow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: TriageState::new(),
        }
    }

    pub fn with_email(backend: B, email: EmailContent) -> Self {
        Self {
            backend,
            state: TriageState::with_email(email),
        }
    }

    pub fn set_email(&mut self, email: EmailContent) {
        self.state.email = Some(email);
    }

    /// The run state, retained across failures for diagnostic inspection.
    pub fn state(&self) -> &TriageState {
        &self.state
    }

    pub fn into_state(self) -> TriageState {
        self.state
    }

    /// Run the triage to completion and return the final materials.
    ///
    /// Hard-step failures abort the run; whatever state was produced before
    /// the failure stays available through [`TriageFlow::state`].
    pub async fn run(&mut self) -> Result<Map<String, Value>, TriageError> {
        let email = self.start()?;
        self.analyze_intent(&email).await?;
        match self.decide() {
            Decision::CanPrepareInfo => {
                self.retrieve_information(&email).await?;
                self.create_answer(&email).await?;
                self.summarize_from_answer(&email).await;
            }
            Decision::CannotPrepareInfo => {
                self.summarize_from_email(&email).await;
            }
        }
        self.prepare_final_material(&email).await
    }

    /// Run the triage and fold any error into an `{"error": ..}` mapping,
    /// so nothing raises past the run boundary.
    pub async fn kickoff(&mut self) -> Map<String, Value> {
        match self.run().await {
            Ok(materials) => materials,
            Err(e) => {
                tracing::error!(
                    "[Flow] Run {} aborted: {}",
                    self.state.run_id,
                    e
                );
                let mut map = Map::new();
                map.insert("error".to_string(), Value::String(e.to_string()));
                map
            }
        }
    }

    fn start(&self) -> Result<EmailContent, TriageError> {
        tracing::info!("[Flow] Run {}: intent not identified, starting triage", self.state.run_id);
        self.state.email.clone().ok_or(TriageError::EmailNotSet)
    }

    async fn analyze_intent(&mut self, email: &EmailContent) -> Result<(), TriageError> {
        tracing::info!("[Flow] Analyzing whether a general answer can be prepared");

        let ctx = StepContext::new().with("email_content", ContextValue::Email(email.clone()));
        match self.backend.execute(StepId::AnalyzeIntent, &ctx).await {
            Ok(result) => {
                let mut analysis = Map::new();
                analysis.insert("raw".to_string(), Value::String(result.raw.clone()));

                match &result.structured {
                    Some(parsed) => {
                        for (key, value) in parsed {
                            analysis.insert(key.clone(), value.clone());
                        }
                        self.state.can_prepare_info = parsed
                            .get("can_prepare_general_answer")
                            .and_then(Value::as_bool)
                            .unwrap_or(false);
                    }
                    None => {
                        self.state.can_prepare_info =
                            flag_is_true(&result.raw, "can_prepare_general_answer");
                    }
                }

                self.state.analysis_results = Some(analysis);
                tracing::info!(
                    "[Flow] Analysis complete, can prepare general info: {}",
                    self.state.can_prepare_info
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("[Flow] Error during text analysis: {}", e);
                self.state.can_prepare_info = false;
                Err(e)
            }
        }
    }

    /// Pure branch evaluation; no external call.
    fn decide(&self) -> Decision {
        let decision = if self.state.can_prepare_info {
            Decision::CanPrepareInfo
        } else {
            Decision::CannotPrepareInfo
        };
        tracing::info!(
            "[Flow] Decision: {} to prepare info",
            if self.state.can_prepare_info { "able" } else { "unable" }
        );
        decision
    }

    async fn retrieve_information(&mut self, email: &EmailContent) -> Result<(), TriageError> {
        tracing::info!("[Flow] Knowledge base lookup");

        let ctx = StepContext::new()
            .with("email_content", ContextValue::Email(email.clone()))
            .with(
                "analysis_results",
                ContextValue::Json(map_or_null(&self.state.analysis_results)),
            );
        match self.backend.execute(StepId::RetrieveInformation, &ctx).await {
            Ok(result) => {
                self.state.retrieved_info = Some(result.structured_or_raw());
                tracing::info!("[Flow] Knowledge base search complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!("[Flow] Error during information retrieval: {}", e);
                self.state.retrieved_info =
                    Some(error_placeholder("Failed to retrieve information"));
                Err(e)
            }
        }
    }

    async fn create_answer(&mut self, email: &EmailContent) -> Result<(), TriageError> {
        tracing::info!("[Flow] Creating answer based on general info");

        let ctx = StepContext::new()
            .with("email_content", ContextValue::Email(email.clone()))
            .with(
                "analysis_results",
                ContextValue::Json(map_or_null(&self.state.analysis_results)),
            )
            .with(
                "retrieved_info",
                ContextValue::Json(map_or_null(&self.state.retrieved_info)),
            );
        match self.backend.execute(StepId::CreateGeneralAnswer, &ctx).await {
            Ok(result) => {
                self.state.created_response = Some(result.structured_or_raw());
                tracing::info!("[Flow] General answer created");
                Ok(())
            }
            Err(e) => {
                tracing::error!("[Flow] Error during answer creation: {}", e);
                self.state.created_response = Some(error_placeholder("Failed to create answer"));
                Err(e)
            }
        }
    }

    async fn summarize_from_answer(&mut self, email: &EmailContent) {
        tracing::info!("[Flow] Drafting a summary from the answer");

        let ctx = StepContext::new()
            .with("email_content", ContextValue::Email(email.clone()))
            .with(
                "created_response",
                ContextValue::Json(map_or_null(&self.state.created_response)),
            );
        match self.backend.execute(StepId::CreateEmailSummary, &ctx).await {
            Ok(result) => {
                self.state.email_summary = result.raw;
                tracing::info!("[Flow] Summary from answer drafted");
            }
            Err(e) => {
                // Swallowed: the run must still reach human handoff.
                tracing::error!("[Flow] Error during summary creation: {}", e);
                self.state.email_summary = "Failed to create summary from answer".to_string();
            }
        }
    }

    async fn summarize_from_email(&mut self, email: &EmailContent) {
        tracing::info!("[Flow] Creating a summary from the email");

        let ctx = StepContext::new().with("email_content", ContextValue::Email(email.clone()));
        match self.backend.execute(StepId::CreateEmailSummary, &ctx).await {
            Ok(result) => {
                self.state.email_summary = result.raw;
                tracing::info!("[Flow] Email summary created");
            }
            Err(e) => {
                // Swallowed: the run must still reach human handoff.
                tracing::error!("[Flow] Error during email summary creation: {}", e);
                self.state.email_summary = "Failed to create summary from email".to_string();
            }
        }
    }

    async fn prepare_final_material(
        &mut self,
        email: &EmailContent,
    ) -> Result<Map<String, Value>, TriageError> {
        tracing::info!("[Flow] Preparing materials for human agent handoff");

        let ctx = StepContext::new()
            .with("email_content", ContextValue::Email(email.clone()))
            .with(
                "email_summary",
                ContextValue::Text(self.state.email_summary.clone()),
            )
            .with(
                "created_response",
                ContextValue::Json(map_or_null(&self.state.created_response)),
            )
            .with(
                "retrieved_info",
                ContextValue::Json(map_or_null(&self.state.retrieved_info)),
            );
        match self.backend.execute(StepId::PrepareFinalMaterial, &ctx).await {
            Ok(result) => {
                let materials = result.structured_or_raw();
                self.state.final_materials = Some(materials.clone());
                tracing::info!(
                    "[Flow] Run {} complete, materials prepared for agent handoff",
                    self.state.run_id
                );
                Ok(materials)
            }
            Err(e) => {
                tracing::error!("[Flow] Error during final material preparation: {}", e);
                self.state.final_materials =
                    Some(error_placeholder("Failed to prepare final materials"));
                Err(e)
            }
        }
    }
}

/// Absent mappings travel as JSON null, which normalizes to empty text.
fn map_or_null(map: &Option<Map<String, Value>>) -> Value {
    match map {
        Some(m) => Value::Object(m.clone()),
        None => Value::Null,
    }
}

fn error_placeholder(message: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("error".to_string(), Value::String(message.to_string()));
    map
}
