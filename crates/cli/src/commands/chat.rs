//! `ncert-tutor chat`: an interactive tutoring session.

use std::sync::Arc;

use tutor_cli::image::load_image;
use tutor_cli::input::{self, HELP, UserIntent};
use tutor_cli::{ChatScreen, TurnRequest, drive_turn};
use tutor_config::{API_KEY_ENV_VARS, AppConfig};
use tutor_core::profile::ModelMode;
use tutor_core::session::{Grade, SessionConfig, TutorMode};
use tutor_providers::{GeminiBackend, ModelRouter};
use tutor_session::SessionController;

/// Setup chosen on the command line.
pub struct ChatArgs {
    pub grade: Grade,
    pub subject: String,
    pub chapter: String,
    pub mode: TutorMode,
    pub response: ModelMode,
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        for var in API_KEY_ENV_VARS {
            eprintln!("    {var}");
        }
        eprintln!();
        eprintln!("  Or add `api_key = \"...\"` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let setup = SessionConfig::new(args.grade, args.subject, args.chapter, args.mode)?;
    let backend = GeminiBackend::from_config(&config)?;
    let router = ModelRouter::from_config(&config);
    let mut controller = SessionController::new(Arc::new(backend), router);

    let mut screen = ChatScreen::new(std::io::stdout(), args.response);
    let status = controller.router().describe(args.response);
    screen.banner(&setup, &status);

    controller.start_session(setup).await?;

    let token = controller.cancellation_token();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    drive_turn(&mut controller, &mut screen, TurnRequest::Opening).await;

    let mut lines = input::spawn_stdin_reader();
    while !token.is_cancelled() {
        screen.prompt();
        let line = tokio::select! {
            _ = token.cancelled() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        match input::parse_intent(&line, screen.has_attachment()) {
            UserIntent::Send(text) => {
                drive_turn(&mut controller, &mut screen, TurnRequest::Message(&text)).await;
            }
            UserIntent::ConceptMap => {
                drive_turn(&mut controller, &mut screen, TurnRequest::ConceptMap).await;
            }
            UserIntent::Attach(path) => match load_image(&path) {
                Ok(uri) => screen.attach(uri, &path.display().to_string()),
                Err(e) => screen.notice(&e.to_string()),
            },
            UserIntent::ClearImage => screen.clear_attachment(),
            UserIntent::Mode(mode) => {
                let status = controller.router().describe(mode);
                screen.set_mode(mode, &status);
            }
            UserIntent::Status => {
                let profile = controller
                    .bound_profile()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "none".into());
                let model = controller.current_model().unwrap_or("none").to_string();
                let status = controller.router().describe(screen.mode());
                let image = if screen.has_attachment() { "yes" } else { "no" };
                screen.notice(&format!("Response mode:  {status}"));
                screen.notice(&format!("Bound profile:  {profile} ({model})"));
                screen.notice(&format!("Image pending:  {image}"));
            }
            UserIntent::Help => screen.notice(HELP),
            UserIntent::Invalid(msg) => screen.notice(&msg),
            UserIntent::Empty => {}
            UserIntent::Exit => break,
        }
    }

    controller.end_session();
    println!();
    println!("  Goodbye! Keep practising.");
    println!();
    Ok(())
}
