//! Step executor — late-bound role dispatch over a single-shot LLM call.
//!
//! The executor is the adapter between the flow controller and the LLM
//! backend: it normalizes the step context into flat text inputs, resolves
//! which role performs the step, gives the knowledge-retrieval role its
//! lookup results, and invokes a single-role, single-step execution with a
//! bounded wait.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TriageError;
use crate::knowledge::{KnowledgeBase, StaticKnowledgeBase};
use crate::llm::{AnthropicCaller, LlmCallConfig, LlmCaller};
use crate::role::{RoleKind, RoleRegistry};
use crate::step::{StepContext, StepId, StepResult};

/// Default bounded wait per step invocation.
const DEFAULT_STEP_TIMEOUT_SECS: u64 = 300;

/// The execution seam between the flow controller and the LLM backend.
///
/// One implementation per run; concurrent runs each own their instance.
#[async_trait]
pub trait StepBackend: Send + Sync {
    async fn execute(&self, step: StepId, context: &StepContext)
        -> Result<StepResult, TriageError>;
}

#[async_trait]
impl<T: StepBackend + ?Sized> StepBackend for std::sync::Arc<T> {
    async fn execute(
        &self,
        step: StepId,
        context: &StepContext,
    ) -> Result<StepResult, TriageError> {
        (**self).execute(step, context).await
    }
}

/// Executes steps against an LLM caller with late-bound roles.
pub struct StepExecutor {
    caller: Box<dyn LlmCaller>,
    config: LlmCallConfig,
    roles: RoleRegistry,
    knowledge: Box<dyn KnowledgeBase>,
    step_timeout: Duration,
}

impl StepExecutor {
    /// Executor with the default Anthropic caller, builtin roles, and the
    /// static knowledge base.
    pub fn new(config: LlmCallConfig) -> Self {
        Self {
            caller: Box::new(AnthropicCaller::new()),
            config,
            roles: RoleRegistry::builtin(),
            knowledge: Box::new(StaticKnowledgeBase::new()),
            step_timeout: Duration::from_secs(DEFAULT_STEP_TIMEOUT_SECS),
        }
    }

    pub fn with_caller(mut self, caller: Box<dyn LlmCaller>) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_roles(mut self, roles: RoleRegistry) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_knowledge(mut self, knowledge: Box<dyn KnowledgeBase>) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Render the user prompt: step description, expected output, then the
    /// normalized inputs.
    fn build_user_prompt(
        &self,
        step: StepId,
        inputs: &BTreeMap<String, String>,
    ) -> String {
        let def = step.definition();
        let mut prompt = String::new();
        prompt.push_str(def.description);
        prompt.push_str("\n\nExpected output: ");
        prompt.push_str(def.expected_output);
        prompt.push_str("\n\n## Inputs\n");
        for (key, value) in inputs {
            prompt.push_str(&format!("\n### {}\n{}\n", key, value));
        }
        prompt
    }
}

#[async_trait]
impl StepBackend for StepExecutor {
    async fn execute(
        &self,
        step: StepId,
        context: &StepContext,
    ) -> Result<StepResult, TriageError> {
        let def = step.definition();
        let mut inputs = context.normalize();

        let role_kind = step.role();
        let role = self.roles.get(role_kind).ok_or_else(|| {
            TriageError::Config(format!("no role definition for '{}'", role_kind))
        })?;

        // The knowledge-retrieval role is the only one granted lookup
        // access; its results join the inputs before the LLM call.
        if role_kind == RoleKind::KnowledgeRetriever {
            let query = inputs
                .get("subject")
                .or_else(|| inputs.get("body"))
                .cloned()
                .unwrap_or_default();
            let records = self.knowledge.search(&query);
            inputs.insert(
                "knowledge_results".to_string(),
                serde_json::to_string(&records).unwrap_or_default(),
            );
        }

        let system_prompt = role.system_prompt();
        let user_prompt = self.build_user_prompt(step, &inputs);

        let mut config = self.config.clone();
        if let Some(model) = &role.model {
            config.model = model.clone();
        }

        tracing::info!("[Executor] Executing step '{}' as {}", step, role_kind);

        let response = tokio::time::timeout(
            self.step_timeout,
            self.caller.call(&config, &system_prompt, &user_prompt),
        )
        .await
        .map_err(|_| TriageError::Timeout {
            step: step.as_str(),
            secs: self.step_timeout.as_secs(),
        })?
        .map_err(|e| {
            tracing::error!(
                "[Executor] Step '{}' failed ({}): {} (inputs: {:?})",
                step,
                def.description,
                e,
                inputs
            );
            e
        })?;

        if !response.success {
            let message = response
                .error
                .unwrap_or_else(|| "unknown execution failure".to_string());
            tracing::error!(
                "[Executor] Step '{}' failed ({}): {} (inputs: {:?})",
                step,
                def.description,
                message,
                inputs
            );
            return Err(TriageError::Step {
                step: step.as_str(),
                message,
            });
        }

        Ok(StepResult::from_raw(response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::EmailContent;
    use crate::llm::LlmResponse;
    use crate::step::ContextValue;
    use std::sync::{Arc, Mutex};

    /// Caller that records calls (model, system prompt, user prompt) and
    /// replies from a queue.
    struct FakeCaller {
        replies: Mutex<Vec<LlmResponse>>,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl FakeCaller {
        fn new(replies: Vec<LlmResponse>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn ok(content: &str) -> LlmResponse {
            LlmResponse {
                content: content.to_string(),
                model: "test-model".to_string(),
                usage: None,
                success: true,
                error: None,
            }
        }
    }

    #[async_trait]
    impl LlmCaller for Arc<FakeCaller> {
        async fn call(
            &self,
            config: &LlmCallConfig,
            system_prompt: &str,
            user_prompt: &str,
        ) -> Result<LlmResponse, TriageError> {
            self.seen.lock().unwrap().push((
                config.model.clone(),
                system_prompt.to_string(),
                user_prompt.to_string(),
            ));
            Ok(self.replies.lock().unwrap().remove(0))
        }
    }

    struct SlowCaller;

    #[async_trait]
    impl LlmCaller for SlowCaller {
        async fn call(
            &self,
            _config: &LlmCallConfig,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<LlmResponse, TriageError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            unreachable!("timeout fires first")
        }
    }

    fn test_config() -> LlmCallConfig {
        LlmCallConfig {
            base_url: "http://localhost".to_string(),
            api_key: "test".to_string(),
            model: "test-model".to_string(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn retrieval_prompt_contains_knowledge_and_role() {
        let caller = FakeCaller::new(vec![FakeCaller::ok("found it")]);
        let executor = StepExecutor::new(test_config()).with_caller(Box::new(caller.clone()));

        let ctx = StepContext::new().with(
            "email_content",
            ContextValue::Email(EmailContent::new("Pricing question", "How much?", "a@b.c")),
        );
        let result = executor
            .execute(StepId::RetrieveInformation, &ctx)
            .await
            .unwrap();
        assert_eq!(result.raw, "found it");

        let seen = caller.seen.lock().unwrap();
        let (_, system, user) = &seen[0];
        assert!(system.contains("Knowledge Base Specialist"));
        assert!(user.contains("knowledge_results"));
        assert!(user.contains("Pricing Structure"));
        assert!(user.contains("Search knowledge bases"));
    }

    #[tokio::test]
    async fn non_retrieval_step_gets_no_knowledge() {
        let caller = FakeCaller::new(vec![FakeCaller::ok("ok")]);
        let executor = StepExecutor::new(test_config()).with_caller(Box::new(caller.clone()));

        let ctx = StepContext::new().with(
            "email_content",
            ContextValue::Email(EmailContent::new("S", "B", "a@b.c")),
        );
        executor.execute(StepId::AnalyzeIntent, &ctx).await.unwrap();

        let seen = caller.seen.lock().unwrap();
        let (_, system, user) = &seen[0];
        assert!(system.contains("Email Intent Analyzer"));
        assert!(!user.contains("knowledge_results"));
    }

    #[tokio::test]
    async fn role_model_overrides_config_model() {
        let caller = FakeCaller::new(vec![FakeCaller::ok("ok")]);
        let mut roles = RoleRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("analyzer.yaml"),
            "kind: analyzer\nrole: \"A\"\ngoal: \"g\"\nbackstory: \"b\"\nmodel: \"override-model\"\n",
        )
        .unwrap();
        roles.load_dir(dir.path().to_str().unwrap()).unwrap();

        let executor = StepExecutor::new(test_config())
            .with_caller(Box::new(caller.clone()))
            .with_roles(roles);
        let ctx = StepContext::new();
        executor.execute(StepId::AnalyzeIntent, &ctx).await.unwrap();

        let seen = caller.seen.lock().unwrap();
        let (model, system, _) = &seen[0];
        assert_eq!(model, "override-model");
        assert!(system.contains("You are A."));
    }

    #[tokio::test]
    async fn unsuccessful_response_surfaces_as_step_error() {
        let caller = FakeCaller::new(vec![LlmResponse {
            content: String::new(),
            model: "test-model".to_string(),
            usage: None,
            success: false,
            error: Some("API returned 429".to_string()),
        }]);
        let executor = StepExecutor::new(test_config()).with_caller(Box::new(caller));

        let ctx = StepContext::new();
        let err = executor
            .execute(StepId::CreateEmailSummary, &ctx)
            .await
            .unwrap_err();
        match err {
            TriageError::Step { step, message } => {
                assert_eq!(step, "create_email_summary");
                assert!(message.contains("429"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn step_times_out() {
        let executor = StepExecutor::new(test_config())
            .with_caller(Box::new(SlowCaller))
            .with_step_timeout(Duration::from_secs(1));

        let ctx = StepContext::new();
        let err = executor
            .execute(StepId::AnalyzeIntent, &ctx)
            .await
            .unwrap_err();
        match err {
            TriageError::Timeout { step, secs } => {
                assert_eq!(step, "analyze_intent");
                assert_eq!(secs, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
