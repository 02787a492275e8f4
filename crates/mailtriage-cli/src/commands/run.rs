//! `mailtriage run` — triage one email end to end.

use std::time::Duration;

use mailtriage_core::{EmailContent, LlmCallConfig, RoleRegistry, StepExecutor, TriageFlow};

use super::load_dotenv;

pub async fn run(
    subject: &str,
    body: &str,
    sender: &str,
    roles_dir: Option<&str>,
    timeout_secs: u64,
) -> Result<(), String> {
    // Load .env / .env.local if present (for API keys, etc.)
    load_dotenv();

    let config = LlmCallConfig::from_env().map_err(|e| e.to_string())?;

    let mut executor =
        StepExecutor::new(config).with_step_timeout(Duration::from_secs(timeout_secs));
    if let Some(dir) = roles_dir {
        let mut roles = RoleRegistry::builtin();
        let count = roles.load_dir(dir).map_err(|e| e.to_string())?;
        println!("Loaded {} role override(s) from '{}'", count, dir);
        executor = executor.with_roles(roles);
    }

    let email = EmailContent::new(subject, body, sender);
    println!("📧 Triaging email from {}: {}", email.sender, email.subject);
    println!();

    let mut flow = TriageFlow::with_email(executor, email);
    let outcome = flow.kickoff().await;

    let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(outcome.clone()))
        .map_err(|e| format!("failed to render materials: {}", e))?;
    println!("{}", rendered);

    match outcome.get("error") {
        Some(error) => Err(format!("triage failed: {}", error)),
        None => {
            println!();
            println!("🎉 Materials ready for human handoff");
            Ok(())
        }
    }
}
