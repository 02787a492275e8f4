//! mailtriage CLI — drive the email-triage flow from the command line.
//!
//! Reuses the core domain logic (mailtriage-core); this binary only parses
//! arguments, initializes logging, and prints results.

mod commands;

use clap::{Parser, Subcommand};

/// mailtriage CLI — LLM-backed email triage
#[derive(Parser)]
#[command(name = "mailtriage", version, about = "mailtriage CLI — LLM-backed email triage")]
struct Cli {
    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Triage one email and print the handoff materials
    Run {
        /// The email subject
        #[arg(long, default_value = "Question about your product")]
        subject: String,

        /// The email body
        #[arg(
            long,
            default_value = "Hello,\n\nI came across your company online and I'm interested \
                in learning more. I'm not entirely sure if your services would be a good fit \
                for what I need, but I'd like to understand what options might be available.\n\n\
                Could you provide me with some general information?\n\nThanks,\nJohn"
        )]
        body: String,

        /// The email sender address
        #[arg(long, default_value = "john.doe@example.com")]
        sender: String,

        /// Directory with YAML role definition overrides
        #[arg(long)]
        roles_dir: Option<String>,

        /// Bounded wait per step, in seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },

    /// List role definitions (builtin plus any file overrides)
    Roles {
        /// Directory with YAML role definition overrides
        #[arg(long)]
        roles_dir: Option<String>,
    },

    /// Query the knowledge base
    Knowledge {
        /// The search query
        query: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "mailtriage_core=debug,mailtriage=debug"
    } else {
        "mailtriage_core=info,mailtriage=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let result = match cli.command {
        Commands::Run {
            subject,
            body,
            sender,
            roles_dir,
            timeout_secs,
        } => {
            commands::run::run(&subject, &body, &sender, roles_dir.as_deref(), timeout_secs).await
        }
        Commands::Roles { roles_dir } => commands::roles::list(roles_dir.as_deref()),
        Commands::Knowledge { query } => commands::knowledge::search(&query),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
