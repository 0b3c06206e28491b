//! The check-in command.

use crate::app::App;
use crate::commands::styled_tier;
use clap::Args;
use console::style;
use saini_core::config::Config;

/// Checkin command arguments.
#[derive(Args)]
pub struct CheckinArgs {
    /// User checking in
    #[arg(short, long)]
    pub user: String,

    /// How the user is feeling
    pub message: String,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the checkin command.
pub async fn run(args: CheckinArgs, config: &Config) -> anyhow::Result<()> {
    let app = App::build(config).await?;
    let (outcome, memory_write) = app
        .service()
        .check_in_tracked(&args.user, &args.message)
        .await?;

    // Let the memory write finish before the process exits.
    memory_write.await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("Tier: {}", styled_tier(outcome.tier));
    println!("\n{}", outcome.reply.text);
    println!("{}", style(format!("({})", outcome.reply.tone)).dim());

    if !outcome.related_memories.is_empty() {
        println!("\nRelated check-ins:");
        for memory in &outcome.related_memories {
            println!(
                "  {} {}",
                style(format!("{:>7.4}", memory.similarity)).cyan(),
                memory.record.text
            );
        }
    }

    Ok(())
}
