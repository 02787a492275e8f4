//! Role capabilities and their definitions.
//!
//! Every step executes under exactly one of four role capabilities. The
//! definitions (role title, goal, backstory) ship as builtins and can be
//! overridden from YAML files in a directory:
//!
//! ```yaml
//! kind: analyzer
//! role: "Email Intent Analyzer"
//! goal: "Analyze emails to determine their intent"
//! backstory: "You are specialized in understanding customer emails."
//! model: "claude-3-7-sonnet-20250219"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// The four role capabilities a step can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Analyzer,
    KnowledgeRetriever,
    ContentCreator,
    SummarySpecialist,
}

impl RoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Analyzer => "analyzer",
            RoleKind::KnowledgeRetriever => "knowledge_retriever",
            RoleKind::ContentCreator => "content_creator",
            RoleKind::SummarySpecialist => "summary_specialist",
        }
    }

    pub fn all() -> [RoleKind; 4] {
        [
            RoleKind::Analyzer,
            RoleKind::KnowledgeRetriever,
            RoleKind::ContentCreator,
            RoleKind::SummarySpecialist,
        ]
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A role definition: the persona a step executes under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDef {
    /// Which capability this definition fills
    pub kind: RoleKind,

    /// Display role title (e.g., "Email Intent Analyzer")
    pub role: String,

    /// What the role is trying to achieve
    pub goal: String,

    /// Persona background woven into the system prompt
    pub backstory: String,

    /// Model override for steps bound to this role
    #[serde(default)]
    pub model: Option<String>,
}

impl RoleDef {
    /// Render the system prompt for a step executing under this role.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {role}. {backstory}\n\nYour goal: {goal}",
            role = self.role,
            backstory = self.backstory,
            goal = self.goal
        )
    }

    /// Parse a role definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, TriageError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| TriageError::Config(format!("failed to parse role YAML: {}", e)))
    }

    /// Load a role definition from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, TriageError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TriageError::Config(format!("failed to read role file '{}': {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }
}

/// Registry of role definitions, keyed by capability.
///
/// Always starts fully populated with the builtins; file loading overrides
/// individual capabilities.
pub struct RoleRegistry {
    roles: HashMap<RoleKind, RoleDef>,
}

impl RoleRegistry {
    /// Registry with the four built-in role definitions.
    pub fn builtin() -> Self {
        let mut roles = HashMap::new();
        for def in builtin_roles() {
            roles.insert(def.kind, def);
        }
        Self { roles }
    }

    /// Load `.yaml`/`.yml` role files from a directory, overriding builtins
    /// per capability. Returns how many definitions were loaded.
    pub fn load_dir(&mut self, dir: &str) -> Result<usize, TriageError> {
        let dir_path = Path::new(dir);
        if !dir_path.is_dir() {
            return Err(TriageError::Config(format!(
                "role directory '{}' does not exist",
                dir
            )));
        }

        let mut count = 0;
        for entry in std::fs::read_dir(dir_path)
            .map_err(|e| TriageError::Config(format!("failed to read directory '{}': {}", dir, e)))?
        {
            let entry =
                entry.map_err(|e| TriageError::Config(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "yaml" && ext != "yml" {
                continue;
            }

            let def = RoleDef::from_file(&path)?;
            tracing::info!("[RoleRegistry] Loaded role: {} ({})", def.kind, def.role);
            self.roles.insert(def.kind, def);
            count += 1;
        }

        Ok(count)
    }

    pub fn get(&self, kind: RoleKind) -> Option<&RoleDef> {
        self.roles.get(&kind)
    }

    pub fn all(&self) -> &HashMap<RoleKind, RoleDef> {
        &self.roles
    }
}

/// The built-in role definitions.
pub fn builtin_roles() -> Vec<RoleDef> {
    vec![
        RoleDef {
            kind: RoleKind::Analyzer,
            role: "Email Intent Analyzer".to_string(),
            goal: "Analyze emails to determine their intent and whether a general answer \
                can be prepared"
                .to_string(),
            backstory: "You are specialized in understanding customer emails and identifying \
                their needs."
                .to_string(),
            model: None,
        },
        RoleDef {
            kind: RoleKind::KnowledgeRetriever,
            role: "Knowledge Base Specialist".to_string(),
            goal: "Find relevant information in knowledge bases and documentation".to_string(),
            backstory: "You excel at searching through knowledge repositories to find answers \
                to customer questions."
                .to_string(),
            model: None,
        },
        RoleDef {
            kind: RoleKind::ContentCreator,
            role: "Content Creator".to_string(),
            goal: "Create helpful responses and materials based on retrieved information"
                .to_string(),
            backstory: "You craft clear, concise content that addresses customer needs \
                effectively."
                .to_string(),
            model: None,
        },
        RoleDef {
            kind: RoleKind::SummarySpecialist,
            role: "Summary Specialist".to_string(),
            goal: "Create concise summaries of emails and responses".to_string(),
            backstory: "You distill complex information into clear, actionable summaries."
                .to_string(),
            model: None,
        },
    ]
}
