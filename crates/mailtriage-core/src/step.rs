//! Step definitions, step results, and context normalization.
//!
//! Steps are reusable templates: the definition carries the prompt text and
//! expected-output hint, never the executing role. Role binding is a pure
//! lookup at dispatch time (`StepId::role`), so definitions are safely
//! shared across concurrent runs.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::email::EmailContent;
use crate::extract::extract_json_object;
use crate::role::RoleKind;

/// Identifier of one discrete unit of triage work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    AnalyzeIntent,
    RetrieveInformation,
    CreateGeneralAnswer,
    CreateEmailSummary,
    PrepareFinalMaterial,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::AnalyzeIntent => "analyze_intent",
            StepId::RetrieveInformation => "retrieve_information",
            StepId::CreateGeneralAnswer => "create_general_answer",
            StepId::CreateEmailSummary => "create_email_summary",
            StepId::PrepareFinalMaterial => "prepare_final_material",
        }
    }

    /// Which role capability executes this step. Consulted at dispatch time;
    /// definitions themselves stay role-free.
    pub fn role(&self) -> RoleKind {
        match self {
            StepId::AnalyzeIntent => RoleKind::Analyzer,
            StepId::RetrieveInformation => RoleKind::KnowledgeRetriever,
            StepId::CreateGeneralAnswer => RoleKind::ContentCreator,
            StepId::CreateEmailSummary => RoleKind::SummarySpecialist,
            StepId::PrepareFinalMaterial => RoleKind::ContentCreator,
        }
    }

    pub fn definition(&self) -> &'static StepDefinition {
        match self {
            StepId::AnalyzeIntent => &STEP_DEFINITIONS[0],
            StepId::RetrieveInformation => &STEP_DEFINITIONS[1],
            StepId::CreateGeneralAnswer => &STEP_DEFINITIONS[2],
            StepId::CreateEmailSummary => &STEP_DEFINITIONS[3],
            StepId::PrepareFinalMaterial => &STEP_DEFINITIONS[4],
        }
    }

    pub fn all() -> [StepId; 5] {
        [
            StepId::AnalyzeIntent,
            StepId::RetrieveInformation,
            StepId::CreateGeneralAnswer,
            StepId::CreateEmailSummary,
            StepId::PrepareFinalMaterial,
        ]
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static per-step metadata. Created once, immutable, shared across runs.
#[derive(Debug)]
pub struct StepDefinition {
    pub id: StepId,
    /// Task description handed to the executing role
    pub description: &'static str,
    /// Expected-output shape hint appended to the prompt
    pub expected_output: &'static str,
}

static STEP_DEFINITIONS: [StepDefinition; 5] = [
    StepDefinition {
        id: StepId::AnalyzeIntent,
        description: "Analyze the incoming email to determine its intent and whether a \
            general answer can be prepared",
        expected_output: "Analysis results with determination if we can prepare a general \
            answer. Respond with a JSON object containing \"can_prepare_general_answer\" \
            (boolean), \"identified_topics\" (array of strings), and \"confidence_score\" \
            (number between 0 and 1).",
    },
    StepDefinition {
        id: StepId::RetrieveInformation,
        description: "Search knowledge bases to find information relevant to the email \
            inquiry",
        expected_output: "Relevant information retrieved from knowledge bases",
    },
    StepDefinition {
        id: StepId::CreateGeneralAnswer,
        description: "Create a general answer based on the email inquiry and retrieved \
            information",
        expected_output: "A comprehensive response to the customer's inquiry",
    },
    StepDefinition {
        id: StepId::CreateEmailSummary,
        description: "Create a concise summary of the email content",
        expected_output: "A summary highlighting the key points of the email",
    },
    StepDefinition {
        id: StepId::PrepareFinalMaterial,
        description: "Prepare the final materials for handoff to a human agent",
        expected_output: "A complete package of materials for the human agent",
    },
];

/// A step invocation's return value: the raw text plus a best-effort
/// structured parse. Folded into the flow state, then discarded.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub raw: String,
    pub structured: Option<Map<String, Value>>,
}

impl StepResult {
    pub fn from_raw(raw: String) -> Self {
        let structured = extract_json_object(&raw);
        Self { raw, structured }
    }

    /// The structured payload, or `{"raw": <text>}` when none was parsed.
    pub fn structured_or_raw(&self) -> Map<String, Value> {
        match &self.structured {
            Some(map) => map.clone(),
            None => {
                let mut map = Map::new();
                map.insert("raw".to_string(), Value::String(self.raw.clone()));
                map
            }
        }
    }
}

/// A value passed into a step invocation before normalization.
#[derive(Debug, Clone)]
pub enum ContextValue {
    /// A structured email record, flattened during normalization
    Email(EmailContent),
    /// Any JSON value; objects and arrays serialize to JSON text
    Json(Value),
    /// A previous step's result, reduced to its raw text
    Result(StepResult),
    /// Plain text, passed through unchanged
    Text(String),
}

/// The context mapping handed to a step invocation.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    entries: Vec<(String, ContextValue)>,
}

impl StepContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) {
        self.entries.push((key.into(), value));
    }

    pub fn with(mut self, key: impl Into<String>, value: ContextValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Normalize the context into the flat string-keyed input mapping the
    /// LLM call consumes:
    ///
    /// - an email expands into `subject` / `body` / `sender` fields plus the
    ///   JSON-serialized full form under its own key
    /// - JSON objects and arrays serialize to JSON text
    /// - a previous step result reduces to its raw text
    /// - null becomes empty text; other scalars coerce to text
    ///
    /// Normalizing an already-flat text mapping is the identity.
    pub fn normalize(&self) -> BTreeMap<String, String> {
        let mut inputs = BTreeMap::new();
        for (key, value) in &self.entries {
            match value {
                ContextValue::Email(email) => {
                    inputs.insert("subject".to_string(), email.subject.clone());
                    inputs.insert("body".to_string(), email.body.clone());
                    inputs.insert("sender".to_string(), email.sender.clone());
                    inputs.insert(
                        key.clone(),
                        serde_json::to_string(email).unwrap_or_default(),
                    );
                }
                ContextValue::Json(json) => {
                    inputs.insert(key.clone(), json_to_text(json));
                }
                ContextValue::Result(result) => {
                    inputs.insert(key.clone(), result.raw.clone());
                }
                ContextValue::Text(text) => {
                    inputs.insert(key.clone(), text.clone());
                }
            }
        }
        inputs
    }
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => serde_json::to_string(value).unwrap_or_default(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_binding_table_is_total() {
        for step in StepId::all() {
            // Every step resolves to a role and a definition with its own id.
            let _ = step.role();
            assert_eq!(step.definition().id, step);
        }
        assert_eq!(StepId::AnalyzeIntent.role(), RoleKind::Analyzer);
        assert_eq!(StepId::RetrieveInformation.role(), RoleKind::KnowledgeRetriever);
        assert_eq!(StepId::CreateGeneralAnswer.role(), RoleKind::ContentCreator);
        assert_eq!(StepId::PrepareFinalMaterial.role(), RoleKind::ContentCreator);
        assert_eq!(StepId::CreateEmailSummary.role(), RoleKind::SummarySpecialist);
    }

    #[test]
    fn email_expands_into_flat_fields_plus_full_form() {
        let email = EmailContent::new("Subj", "Body text", "a@b.c");
        let ctx = StepContext::new().with("email_content", ContextValue::Email(email));
        let inputs = ctx.normalize();
        assert_eq!(inputs.get("subject").unwrap(), "Subj");
        assert_eq!(inputs.get("body").unwrap(), "Body text");
        assert_eq!(inputs.get("sender").unwrap(), "a@b.c");
        let full: Value = serde_json::from_str(inputs.get("email_content").unwrap()).unwrap();
        assert_eq!(full["subject"], "Subj");
    }

    #[test]
    fn mappings_and_sequences_serialize_to_json_text() {
        let ctx = StepContext::new()
            .with("analysis", ContextValue::Json(json!({"topics": ["pricing"]})))
            .with("list", ContextValue::Json(json!([1, 2])));
        let inputs = ctx.normalize();
        assert_eq!(inputs.get("analysis").unwrap(), r#"{"topics":["pricing"]}"#);
        assert_eq!(inputs.get("list").unwrap(), "[1,2]");
    }

    #[test]
    fn null_becomes_empty_and_scalars_coerce() {
        let ctx = StepContext::new()
            .with("absent", ContextValue::Json(Value::Null))
            .with("count", ContextValue::Json(json!(3)))
            .with("flag", ContextValue::Json(json!(true)))
            .with("name", ContextValue::Json(json!("plain")));
        let inputs = ctx.normalize();
        assert_eq!(inputs.get("absent").unwrap(), "");
        assert_eq!(inputs.get("count").unwrap(), "3");
        assert_eq!(inputs.get("flag").unwrap(), "true");
        assert_eq!(inputs.get("name").unwrap(), "plain");
    }

    #[test]
    fn step_result_reduces_to_raw_text() {
        let result = StepResult::from_raw("{\"a\": 1} trailing".to_string());
        let ctx = StepContext::new().with("prev", ContextValue::Result(result));
        let inputs = ctx.normalize();
        assert_eq!(inputs.get("prev").unwrap(), "{\"a\": 1} trailing");
    }

    #[test]
    fn normalization_is_idempotent_on_flat_text() {
        let ctx = StepContext::new()
            .with("subject", ContextValue::Text("Hello".to_string()))
            .with("note", ContextValue::Text("plain".to_string()));
        let once = ctx.normalize();

        let mut again = StepContext::new();
        for (k, v) in &once {
            again.insert(k.clone(), ContextValue::Text(v.clone()));
        }
        assert_eq!(again.normalize(), once);
    }

    #[test]
    fn structured_or_raw_falls_back_to_raw_wrapper() {
        let structured = StepResult::from_raw("{\"k\": \"v\"}".to_string());
        assert_eq!(structured.structured_or_raw().get("k").unwrap(), "v");

        let plain = StepResult::from_raw("no json here".to_string());
        let map = plain.structured_or_raw();
        assert_eq!(map.get("raw").unwrap(), "no json here");
    }
}
