//! Diagnostic command.

use crate::app;
use console::{style, Emoji};
use saini_core::config::{Config, EmbeddingsProvider, ReplyProvider};
use saini_core::{env, paths};

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Run the doctor command.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    println!("Saini Doctor\n");

    let mut errors = 0;
    let mut warnings = 0;

    // Check directories
    println!("Checking directories...");

    match paths::base_dir() {
        Ok(dir) if dir.exists() => {
            println!("  {} Base directory exists: {:?}", style(CHECK).green(), dir);
        }
        Ok(dir) => {
            println!("  {} Base directory missing: {:?}", style(WARN).yellow(), dir);
            println!("    Run 'saini config init' to create it");
            warnings += 1;
        }
        Err(e) => {
            println!("  {} Failed to determine base directory: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    // Check config
    println!("\nChecking configuration...");

    match config.validate() {
        Ok(_) => println!("  {} Configuration valid", style(CHECK).green()),
        Err(e) => {
            println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    // Check environment
    println!("\nChecking environment...");

    let embeddings_var = config.embeddings.api_key_env.clone().unwrap_or_else(|| {
        match config.embeddings.provider {
            EmbeddingsProvider::Openai => env::vars::OPENAI_API_KEY.to_string(),
            EmbeddingsProvider::Titan => env::vars::SAINI_EMBEDDINGS_TOKEN.to_string(),
        }
    });
    if env::get_var(&embeddings_var).is_some() {
        println!("  {} {} is set", style(CHECK).green(), embeddings_var);
    } else if config.embeddings.provider == EmbeddingsProvider::Openai {
        println!("  {} {} not set (required for embeddings)", style(CROSS).red(), embeddings_var);
        errors += 1;
    } else {
        println!("  {} {} not set", style(WARN).yellow(), embeddings_var);
        warnings += 1;
    }

    if config.reply.provider == ReplyProvider::Openai {
        if env::get_var(&config.reply.api_key_env).is_some() {
            println!("  {} {} is set", style(CHECK).green(), config.reply.api_key_env);
        } else {
            println!(
                "  {} {} not set (replies will use the fallback)",
                style(WARN).yellow(),
                config.reply.api_key_env
            );
            warnings += 1;
        }
    }

    // Check storage
    println!("\nChecking storage...");

    match app::memory_store(config).await {
        Ok(_) => println!(
            "  {} Memory store ({:?}) opened",
            style(CHECK).green(),
            config.storage.backend
        ),
        Err(e) => {
            println!("  {} Memory store failed to open: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }
    match app::checkin_store(config) {
        Ok(store) => match store.users().await {
            Ok(users) => println!(
                "  {} Check-in history readable ({} users)",
                style(CHECK).green(),
                users.len()
            ),
            Err(e) => {
                println!("  {} Check-in history unreadable: {}", style(CROSS).red(), e);
                errors += 1;
            }
        },
        Err(e) => {
            println!("  {} Check-in history failed to open: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    // Summary
    println!("\n{}", style("Summary").bold());
    println!("  Errors: {}", if errors > 0 { style(errors).red() } else { style(errors).green() });
    println!("  Warnings: {}", if warnings > 0 { style(warnings).yellow() } else { style(warnings).green() });

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }
    Ok(())
}
