//! NCERT tutor CLI: the main entry point.
//!
//! Commands:
//! - `chat`    Start an interactive tutoring session
//! - `doctor`  Diagnose setup and backend reachability
//! - `config`  Show, validate or create the config file

use clap::{Parser, Subcommand};
use tutor_core::profile::ModelMode;
use tutor_core::session::{Grade, TutorMode};

mod commands;

#[derive(Parser)]
#[command(
    name = "ncert-tutor",
    about = "NCERT Master Tutor: structured, logic-first tutoring in the terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a tutoring session
    Chat {
        /// Grade 6 to Grade 12 (e.g. "Grade 10" or 10)
        #[arg(short, long, default_value = "Grade 10")]
        grade: Grade,

        /// Subject, e.g. Science
        #[arg(short, long)]
        subject: String,

        /// Chapter name as printed in the NCERT textbook
        #[arg(short, long)]
        chapter: String,

        /// Tutoring mode: learn, revise or doubt
        #[arg(short, long, default_value = "learn")]
        mode: TutorMode,

        /// Initial response mode: standard, fast or thinking
        #[arg(short, long, default_value = "standard")]
        response: ModelMode,
    },

    /// Diagnose system health
    Doctor,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Validate the configuration
    Validate,
    /// Print the config file path
    Path,
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries the chat, logs go to stderr
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat {
            grade,
            subject,
            chapter,
            mode,
            response,
        } => {
            commands::chat::run(commands::chat::ChatArgs {
                grade,
                subject,
                chapter,
                mode,
                response,
            })
            .await?
        }
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
        },
    }

    Ok(())
}
