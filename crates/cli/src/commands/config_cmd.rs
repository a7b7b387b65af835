//! `ncert-tutor config`: configuration management commands.

use tutor_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            if config.has_api_key() {
                println!("   ✅ API key configured");
            } else {
                println!("   ⚠️  No API key set (set NCERT_TUTOR_API_KEY or GEMINI_API_KEY)");
            }

            println!();
            println!("   Base URL:        {}", config.base_url);
            println!("   Standard model:  {}", config.models.standard);
            println!("   Fast model:      {}", config.models.fast);
            println!("   Pro model:       {}", config.models.pro);
            println!("   Temperature:     {}", config.temperature);
            println!("   Thinking budget: {} tokens", config.thinking_budget);
            println!("   Timeout:         {}s", config.request_timeout_secs);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_path().display());
    Ok(())
}

/// Write a starter config file unless one exists (or `force` is set).
pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if path.exists() && !force {
        println!("⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", path.display());
    println!("   Add `api_key = \"...\"` or set GEMINI_API_KEY before starting a chat.");
    Ok(())
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}
