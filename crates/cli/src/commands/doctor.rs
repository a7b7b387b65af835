//! `ncert-tutor doctor`: diagnose setup and backend reachability.

use tutor_config::AppConfig;
use tutor_core::provider::Backend;
use tutor_providers::GeminiBackend;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("NCERT Tutor Doctor: System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `ncert-tutor config init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue found. Fix the config file and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
        match GeminiBackend::from_config(&config) {
            Ok(backend) => match backend.health_check().await {
                Ok(true) => println!("  ✅ Backend reachable at {}", config.base_url),
                Ok(false) => {
                    println!("  ❌ Backend rejected the API key");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Backend check failed: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Could not build backend client: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ No API key configured (set GEMINI_API_KEY or add api_key to config.toml)");
        issues += 1;
    }

    println!();
    println!(
        "  Models: standard={} fast={} pro={}",
        config.models.standard, config.models.fast, config.models.pro
    );

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
