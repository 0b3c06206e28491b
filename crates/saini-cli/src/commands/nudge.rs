//! The nudge command.

use crate::app;
use saini_checkin::NudgeRunner;
use saini_core::config::Config;

/// Nudge inactive users.
pub async fn run(config: &Config, days: Option<u32>) -> anyhow::Result<()> {
    let inactive_days = days.unwrap_or(config.nudge.inactive_days);
    if inactive_days == 0 {
        anyhow::bail!("--days must be greater than 0");
    }

    let runner = NudgeRunner::new(
        app::checkin_store(config)?,
        app::reply_generator(&config.reply)?,
        inactive_days,
    );
    let nudged = runner.run(chrono::Utc::now()).await?;

    if nudged.is_empty() {
        println!("Everyone has checked in within {} day(s).", inactive_days);
    } else {
        println!("Nudged {} user(s):", nudged.len());
        for user in nudged {
            println!("  {}", user);
        }
    }
    Ok(())
}
