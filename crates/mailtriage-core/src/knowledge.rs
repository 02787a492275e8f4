//! Knowledge base lookup.
//!
//! The knowledge-retrieval step consults a `KnowledgeBase` before its LLM
//! call. The shipped implementation is a static record set standing in for a
//! real knowledge API; swap in your own implementation behind the trait.

use serde::{Deserialize, Serialize};

/// One topical record returned by a knowledge search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub title: String,
    pub content: String,
}

/// A queryable knowledge source. Results come back in insertion order with
/// no ranking guarantee and no pagination.
pub trait KnowledgeBase: Send + Sync {
    fn search(&self, query: &str) -> Vec<KnowledgeRecord>;
}

/// Static in-memory knowledge base with a fixed record set.
pub struct StaticKnowledgeBase {
    records: Vec<KnowledgeRecord>,
}

impl StaticKnowledgeBase {
    pub fn new() -> Self {
        let records = vec![
            KnowledgeRecord {
                title: "Product Information".to_string(),
                content: "Our product is a comprehensive customer service solution that \
                    combines AI-driven analytics with human-centered design. It features a \
                    unified dashboard, real-time data processing, custom reporting tools, and \
                    seamless integration with existing systems."
                    .to_string(),
            },
            KnowledgeRecord {
                title: "Pricing Structure".to_string(),
                content: "We offer three tiers of service: Basic ($49/month), Professional \
                    ($99/month), and Enterprise (custom pricing). Each tier includes different \
                    feature sets and support levels to accommodate businesses of all sizes."
                    .to_string(),
            },
            KnowledgeRecord {
                title: "Common Applications".to_string(),
                content: "Our solution is commonly used for customer service management, data \
                    analytics, workflow optimization, and compliance tracking. It's \
                    particularly popular in retail, healthcare, finance, and technology \
                    sectors."
                    .to_string(),
            },
            KnowledgeRecord {
                title: "Implementation Process".to_string(),
                content: "Our standard implementation process takes 2-4 weeks and includes \
                    system integration, data migration, customization, and staff training. We \
                    provide dedicated support throughout the entire process."
                    .to_string(),
            },
        ];
        Self { records }
    }

    /// Build a knowledge base from caller-supplied records.
    pub fn with_records(records: Vec<KnowledgeRecord>) -> Self {
        Self { records }
    }
}

impl Default for StaticKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase for StaticKnowledgeBase {
    fn search(&self, query: &str) -> Vec<KnowledgeRecord> {
        tracing::debug!("[Knowledge] Searching knowledge base for: {}", query);
        // TODO: filter by query once this fronts a real search API
        self.records.clone()
    }
}
