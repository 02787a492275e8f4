//! mailtriage core — email-triage flow engine.
//!
//! An incoming email of unclear intent runs through an LLM-backed pipeline:
//! intent analysis decides whether a general-knowledge answer suffices, a
//! knowledge lookup and answer draft run on the positive branch, both
//! branches summarize, and everything converges into a materials package
//! for a human agent.
//!
//! # Architecture
//!
//! ```text
//! EmailContent ──► TriageFlow (controller + TriageState)
//!                       │
//!                  StepBackend ──► StepExecutor
//!                                      │
//!              RoleRegistry ──► system prompt per role
//!              KnowledgeBase ─► lookup for the retrieval step
//!                                      │
//!                                  LlmCaller ──► Anthropic Messages API
//! ```
//!
//! The crate has no CLI or transport dependency; `mailtriage-cli` drives it.

pub mod email;
pub mod error;
pub mod executor;
pub mod extract;
pub mod flow;
pub mod knowledge;
pub mod llm;
pub mod role;
pub mod step;

// Convenience re-exports
pub use email::EmailContent;
pub use error::TriageError;
pub use executor::{StepBackend, StepExecutor};
pub use flow::{Decision, TriageFlow, TriageState};
pub use knowledge::{KnowledgeBase, KnowledgeRecord, StaticKnowledgeBase};
pub use llm::{AnthropicCaller, LlmCallConfig, LlmCaller, LlmResponse};
pub use role::{RoleDef, RoleKind, RoleRegistry};
pub use step::{ContextValue, StepContext, StepDefinition, StepId, StepResult};
