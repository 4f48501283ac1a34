// Casual commands: ping, dice rolls, quotes, and reminders.
//
// Every command here registers both surfaces - the per-guild text prefix and
// the slash variant - on the same handler, so validation and side effects
// cannot drift apart.

use crate::core::dice;
use crate::core::scheduler;
use crate::discord::commands::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::sync::Arc;
use std::time::Duration;

const QUOTES: &[&str] = &[
    "Be kind. Be curious.",
    "Small steps every day.",
    "Don't forget to take breaks!",
    "Code, test, iterate.",
];

/// Check that the bot is alive and see the round-trip latency.
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await.as_millis();
    ctx.say(format!("Pong! {latency}ms")).await?;
    Ok(())
}

/// Roll dice in NdM notation.
#[poise::command(prefix_command, slash_command)]
pub async fn roll(
    ctx: Context<'_>,
    #[description = "Dice to roll in NdM format, e.g. 2d6"] dice: Option<String>,
) -> Result<(), Error> {
    let input = dice.unwrap_or_else(|| "1d6".to_string());

    let Some(spec) = dice::parse_spec(&input) else {
        ctx.send(
            poise::CreateReply::default()
                .content("Usage: roll NdM (e.g. 2d6, d20). Max 100 dice.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let outcome = {
        let mut rng = rand::thread_rng();
        dice::roll(spec, &mut rng)
    };
    ctx.say(format!(
        "🎲 Rolled {input}: {:?} (total: {})",
        outcome.rolls, outcome.total
    ))
    .await?;
    Ok(())
}

/// Get a random quote.
#[poise::command(prefix_command, slash_command)]
pub async fn quote(ctx: Context<'_>) -> Result<(), Error> {
    let pick = {
        use rand::seq::SliceRandom;
        let mut rng = rand::thread_rng();
        QUOTES.choose(&mut rng).copied().unwrap_or(QUOTES[0])
    };
    ctx.say(pick).await?;
    Ok(())
}

/// Set a reminder. The bot DMs you after the given number of minutes.
#[poise::command(prefix_command, slash_command)]
pub async fn remind(
    ctx: Context<'_>,
    #[description = "Minutes until the reminder"] minutes: f64,
    #[description = "Reminder message"]
    #[rest]
    message: String,
) -> Result<(), Error> {
    let Some(delay) = reminder_delay(minutes) else {
        ctx.send(
            poise::CreateReply::default()
                .content("Please provide a positive number of minutes.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    // Acknowledge before handing off; the delivery happens on a detached
    // timer that outlives this invocation.
    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "Okay {}, I'll remind you in {minutes} minute(s).",
                ctx.author().mention()
            ))
            .ephemeral(true),
    )
    .await?;

    let http = ctx.serenity_context().http.clone();
    let cache = ctx.serenity_context().cache.clone();
    let user = ctx.author().clone();
    scheduler::schedule(delay, async move {
        deliver_reminder(http, cache, user, message).await;
    });

    Ok(())
}

// Prefix input arrives as free text, so `minutes` can be anything that
// parses as f64: NaN, infinities, and values whose seconds overflow a
// Duration all get the usage reply instead of a panic.
fn reminder_delay(minutes: f64) -> Option<Duration> {
    if minutes <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(minutes * 60.0).ok()
}

// Delivery order: direct message, then a mention in a shared #general
// channel, then a logged drop. Nothing here surfaces back to the requester.
async fn deliver_reminder(
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    user: serenity::User,
    message: String,
) {
    let text = format!("⏰ Reminder: {message}");
    match user
        .dm(&http, serenity::CreateMessage::new().content(&text))
        .await
    {
        Ok(_) => return,
        Err(e) => {
            tracing::debug!(
                "Reminder DM to {} failed, trying channel fallback: {e}",
                user.name
            );
        }
    }

    let Some(channel_id) = shared_general_channel(&cache, user.id) else {
        tracing::info!(
            "Dropping reminder for {}: no DM and no shared #general channel",
            user.name
        );
        return;
    };

    let content = format!("{} ⏰ Reminder: {message}", user.mention());
    if let Err(e) = channel_id.say(&http, content).await {
        tracing::info!("Dropping reminder for {}: channel fallback failed: {e}", user.name);
    }
}

// Only the first cached guild shared with the user is tried.
fn shared_general_channel(
    cache: &serenity::Cache,
    user_id: serenity::UserId,
) -> Option<serenity::ChannelId> {
    for guild_id in cache.guilds() {
        let Some(guild) = cache.guild(guild_id) else {
            continue;
        };
        if !guild.members.contains_key(&user_id) {
            continue;
        }
        return guild
            .channels
            .values()
            .find(|c| c.kind == serenity::ChannelType::Text && c.name == "general")
            .map(|c| c.id);
    }
    None
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_delay_converts_positive_minutes() {
        assert_eq!(reminder_delay(1.5), Some(Duration::from_secs(90)));
        assert_eq!(reminder_delay(1.0), Some(Duration::from_secs(60)));
    }

    #[test]
    fn reminder_delay_rejects_zero_and_negative_minutes() {
        assert_eq!(reminder_delay(0.0), None);
        assert_eq!(reminder_delay(-5.0), None);
    }

    #[test]
    fn reminder_delay_rejects_non_finite_minutes() {
        assert_eq!(reminder_delay(f64::NAN), None);
        assert_eq!(reminder_delay(f64::INFINITY), None);
        assert_eq!(reminder_delay(f64::NEG_INFINITY), None);
    }

    #[test]
    fn reminder_delay_rejects_minutes_beyond_duration_range() {
        assert_eq!(reminder_delay(1e300), None);
    }
}
