//! Triage flow — run state and the step-sequencing controller.
//!
//! ```text
//! EmailContent ──► TriageFlow ──► StepBackend (StepExecutor)
//!                      │                │
//!                 TriageState      LlmCaller ──► Anthropic API
//!                                       │
//!                                 KnowledgeBase (retrieval step only)
//! ```

pub mod controller;
pub mod state;

pub use controller::{Decision, TriageFlow};
pub use state::TriageState;
