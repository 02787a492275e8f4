//! CLI command implementations.

pub mod knowledge;
pub mod roles;
pub mod run;

/// Load .env and .env.local files for environment variables.
pub(crate) fn load_dotenv() {
    // Try .env.local first (higher priority), then .env
    for filename in &[".env.local", ".env"] {
        let path = std::path::Path::new(filename);
        if path.exists() {
            if let Ok(content) = std::fs::read_to_string(path) {
                for line in content.lines() {
                    let line = line.trim();
                    // Skip comments and empty lines
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    // Parse KEY=VALUE
                    if let Some(eq_idx) = line.find('=') {
                        let key = line[..eq_idx].trim();
                        let mut value = line[eq_idx + 1..].trim().to_string();
                        // Strip surrounding quotes
                        if (value.starts_with('"') && value.ends_with('"'))
                            || (value.starts_with('\'') && value.ends_with('\''))
                        {
                            value = value[1..value.len() - 1].to_string();
                        }
                        // Only set if not already present (existing env vars take priority)
                        if std::env::var(key).is_err() {
                            std::env::set_var(key, &value);
                        }
                    }
                }
                tracing::info!("[Cli] Loaded environment from '{}'", filename);
            }
        }
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
