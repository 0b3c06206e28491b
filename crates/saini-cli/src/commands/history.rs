//! History, users, and analytics commands.

use crate::app;
use crate::commands::styled_tier;
use console::style;
use saini_checkin::UserAnalytics;
use saini_core::config::Config;

/// Print check-ins, newest first.
pub async fn history(config: &Config, user: Option<&str>, limit: Option<usize>) -> anyhow::Result<()> {
    let store = app::checkin_store(config)?;
    let checkins = store.list(user).await?;

    if checkins.is_empty() {
        println!("No check-ins yet.");
        return Ok(());
    }

    for checkin in checkins.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{} {} [{}] {}",
            style(checkin.timestamp.format("%Y-%m-%d %H:%M")).dim(),
            style(&checkin.owner_id).bold(),
            styled_tier(checkin.tier),
            checkin.message
        );
        println!("    {} {}", style("↳").dim(), checkin.response);
    }

    Ok(())
}

/// Print every user with a check-in.
pub async fn users(config: &Config) -> anyhow::Result<()> {
    let store = app::checkin_store(config)?;
    for user in store.users().await? {
        println!("{}", user);
    }
    Ok(())
}

/// Print a user's analytics summary.
pub async fn analytics(config: &Config, user: &str, json: bool) -> anyhow::Result<()> {
    let store = app::checkin_store(config)?;
    let checkins = store.list(Some(user)).await?;
    let Some(stats) = UserAnalytics::compute(user, &checkins) else {
        anyhow::bail!("No check-ins for user {}", user);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", style(format!("Analytics for {}", stats.owner_id)).bold());
    println!("  Total reflections: {}", stats.total_reflections);
    println!(
        "  Latest: {} ({}) at {}",
        styled_tier(stats.latest_tier),
        stats.latest_tone,
        stats.last_checkin.format("%Y-%m-%d %H:%M")
    );

    println!("\n  Tiers:");
    for (tier, count) in &stats.tier_distribution {
        println!(
            "    {:<10} {:>4}  {:>5.1}%",
            tier.as_str(),
            count,
            stats.tier_share(*tier) * 100.0
        );
    }

    println!("\n  Tones:");
    for (tone, count) in &stats.tone_distribution {
        println!("    {:<10} {:>4}", tone, count);
    }

    Ok(())
}
