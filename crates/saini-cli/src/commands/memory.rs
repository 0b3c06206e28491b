//! Semantic memory commands.

use crate::app::App;
use clap::Args;
use console::style;
use saini_core::config::Config;
use saini_memory::{Metadata, RetrievalStatus};

/// Memory command arguments.
#[derive(Args)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub command: MemoryCommand,
}

#[derive(clap::Subcommand)]
pub enum MemoryCommand {
    /// Embed and store a memory
    Store {
        /// Owner of the memory
        #[arg(short, long)]
        user: String,

        /// Text to remember
        text: String,

        /// Metadata entry as key=value (repeatable)
        #[arg(long)]
        meta: Vec<String>,
    },

    /// Find the memories most similar to a query
    Retrieve {
        /// Owner whose memories are searched
        #[arg(short, long)]
        user: String,

        /// Query text
        query: String,

        /// Number of results (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Count a user's stored memories
    Count {
        /// Owner to count
        #[arg(short, long)]
        user: String,
    },
}

/// Parse `key=value` pairs. Values that are valid JSON keep their type,
/// anything else is stored as a string.
pub fn parse_metadata(pairs: &[String]) -> anyhow::Result<Metadata> {
    let mut metadata = Metadata::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid metadata entry (expected key=value): {}", pair))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Metadata key must not be empty: {}", pair);
        }
        let parsed: serde_json::Value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        metadata.insert(key.to_string(), parsed);
    }
    Ok(metadata)
}

/// Run the memory command.
pub async fn run(args: MemoryArgs, config: &Config) -> anyhow::Result<()> {
    let app = App::build(config).await?;

    match args.command {
        MemoryCommand::Store { user, text, meta } => {
            let metadata = parse_metadata(&meta)?;
            let record_id = app.ingest().store(&user, &text, metadata).await?;
            println!("Stored memory {}", record_id);
        }

        MemoryCommand::Retrieve {
            user,
            query,
            top_k,
            json,
        } => {
            let top_k = top_k.unwrap_or(config.retrieval.top_k);
            let retrieval = app.retriever().retrieve(&user, &query, top_k).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&retrieval)?);
                return Ok(());
            }

            if retrieval.status == RetrievalStatus::NoMemories {
                println!("No memories found for {}", user);
                return Ok(());
            }

            for (rank, memory) in retrieval.memories.iter().enumerate() {
                println!(
                    "{}. {} {}",
                    rank + 1,
                    style(format!("{:>7.4}", memory.similarity)).cyan(),
                    memory.record.text
                );
                println!(
                    "   {}",
                    style(format!(
                        "{} {}",
                        memory.record.created_at.format("%Y-%m-%d %H:%M"),
                        memory.record.record_id
                    ))
                    .dim()
                );
            }
            if retrieval.skipped > 0 {
                println!(
                    "{}",
                    style(format!("{} record(s) skipped", retrieval.skipped)).yellow()
                );
            }
        }

        MemoryCommand::Count { user } => {
            println!("{}", app.memories.count(&user).await?);
        }
    }

    Ok(())
}
