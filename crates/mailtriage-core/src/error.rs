//! Core error type for the mailtriage pipeline.
//!
//! `TriageError` is used throughout the core domain (flow, executor, LLM
//! caller). Parse failures are deliberately absent: structured-output
//! extraction degrades through heuristics and never surfaces as an error.

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// The triage run was started without an email in the state.
    #[error("email not set")]
    EmailNotSet,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("LLM call failed: {0}")]
    Llm(String),

    /// A step's underlying execution reported a failure.
    #[error("step '{step}' failed: {message}")]
    Step { step: &'static str, message: String },

    /// A step did not complete within the bounded per-step wait.
    #[error("step '{step}' timed out after {secs}s")]
    Timeout { step: &'static str, secs: u64 },
}
