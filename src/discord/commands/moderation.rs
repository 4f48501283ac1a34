// Moderation commands. Every handler consults the permission gate before any
// side effect and appends one audit line to the action-log sink afterwards.

use crate::core::permissions::{is_authorized, PermissionContext};
use crate::core::scheduler;
use crate::discord::action_log::log_action;
use crate::discord::commands::{Context, Error};
use crate::discord::permissions::caller_attributes;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

const MUTE_ROLE_NAME: &str = "Muted";

// Gate check shared by every privileged handler: deny replies to the caller
// only, the target never hears about it.
async fn ensure_privileged(ctx: &Context<'_>) -> Result<bool, Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let caller = caller_attributes(ctx).await?;
    let config = ctx.data().configs.get(guild_id.get()).await;
    let authorized = is_authorized(&PermissionContext {
        is_administrator: caller.is_administrator,
        has_manage_guild: caller.has_manage_guild,
        caller_role_names: &caller.role_names,
        config: &config,
    });

    if !authorized {
        ctx.send(
            poise::CreateReply::default()
                .content("You don't have permission to do that.")
                .ephemeral(true),
        )
        .await?;
    }
    Ok(authorized)
}

/// Delete recent messages from this channel.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "Number of recent messages to delete"] limit: Option<u32>,
) -> Result<(), Error> {
    if !ensure_privileged(&ctx).await? {
        return Ok(());
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let limit = limit.unwrap_or(10).clamp(1, 100) as u8;
    let http = &ctx.serenity_context().http;

    let messages = match ctx
        .channel_id()
        .messages(http, serenity::GetMessages::new().limit(limit))
        .await
    {
        Ok(messages) => messages,
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("Failed to purge: {e}"))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    let mut deleted = 0usize;
    for message in &messages {
        match ctx.channel_id().delete_message(http, message.id).await {
            Ok(()) => deleted += 1,
            // Keep going; one stubborn message should not abort the sweep.
            Err(e) => tracing::debug!("Purge: failed to delete message {}: {e}", message.id),
        }
    }
    ctx.send(
        poise::CreateReply::default()
            .content(format!("Deleted {deleted} messages."))
            .ephemeral(true),
    )
    .await?;

    let channel_name = ctx
        .channel_id()
        .name(ctx)
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    log_action(
        http,
        &ctx.data().configs,
        guild_id,
        &format!(
            "{} purged {deleted} messages in #{channel_name}.",
            ctx.author().name
        ),
    )
    .await;
    Ok(())
}

/// Kick a member from the server.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::Member,
    #[description = "Reason for the kick"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if !ensure_privileged(&ctx).await? {
        return Ok(());
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let reason_text = reason.as_deref().unwrap_or("");
    match member
        .kick_with_reason(&ctx.serenity_context().http, reason_text)
        .await
    {
        Ok(()) => {
            ctx.say(format!("Kicked {}.", member.user.name)).await?;
            log_action(
                &ctx.serenity_context().http,
                &ctx.data().configs,
                guild_id,
                &format!(
                    "{} kicked {}. Reason: {}",
                    ctx.author().name,
                    member.user.name,
                    reason.as_deref().unwrap_or("None")
                ),
            )
            .await;
        }
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("Failed to kick: {e}"))
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

/// Ban a member from the server.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::Member,
    #[description = "Delete message history days (0-7)"] days: Option<u8>,
    #[description = "Reason for the ban"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if !ensure_privileged(&ctx).await? {
        return Ok(());
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let days = days.unwrap_or(0);
    let reason_text = reason.as_deref().unwrap_or("");
    match member
        .ban_with_reason(&ctx.serenity_context().http, days, reason_text)
        .await
    {
        Ok(()) => {
            ctx.say(format!("Banned {}.", member.user.name)).await?;
            log_action(
                &ctx.serenity_context().http,
                &ctx.data().configs,
                guild_id,
                &format!(
                    "{} banned {}. Reason: {}",
                    ctx.author().name,
                    member.user.name,
                    reason.as_deref().unwrap_or("None")
                ),
            )
            .await;
        }
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("Failed to ban: {e}"))
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

/// Mute a member, optionally auto-unmuting after a number of minutes.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] member: serenity::Member,
    #[description = "Minutes until auto-unmute (0 = until unmuted manually)"] minutes: Option<u64>,
) -> Result<(), Error> {
    if !ensure_privileged(&ctx).await? {
        return Ok(());
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let minutes = minutes.unwrap_or(0);
    let http = ctx.serenity_context().http.clone();

    let role_id = match find_mute_role(&ctx) {
        Some(role_id) => role_id,
        None => match create_mute_role(&ctx, guild_id).await {
            Ok(role_id) => role_id,
            Err(e) => {
                ctx.send(
                    poise::CreateReply::default()
                        .content(format!("Failed to mute: {e}"))
                        .ephemeral(true),
                )
                .await?;
                return Ok(());
            }
        },
    };

    if let Err(e) = member.add_role(&http, role_id).await {
        ctx.send(
            poise::CreateReply::default()
                .content(format!("Failed to mute: {e}"))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.say(format!("Muted {}.", member.user.name)).await?;
    log_action(
        &http,
        &ctx.data().configs,
        guild_id,
        &format!("{} muted {}.", ctx.author().name, member.user.name),
    )
    .await;

    if minutes > 0 {
        let configs = Arc::clone(&ctx.data().configs);
        let user_id = member.user.id;
        let target_name = member.user.name.clone();
        scheduler::schedule(mute_duration(minutes), async move {
            // The member or role may be long gone by now; that is fine.
            match http
                .remove_member_role(guild_id, user_id, role_id, Some("Mute duration elapsed"))
                .await
            {
                Ok(()) => {
                    log_action(
                        &http,
                        &configs,
                        guild_id,
                        &format!("Auto-unmuted {target_name} after {minutes} minute(s)."),
                    )
                    .await;
                }
                Err(e) => tracing::debug!("Auto-unmute for {target_name} skipped: {e}"),
            }
        });
    }
    Ok(())
}

/// Remove the mute role from a member.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute"] member: serenity::Member,
) -> Result<(), Error> {
    if !ensure_privileged(&ctx).await? {
        return Ok(());
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let Some(role_id) = find_mute_role(&ctx) else {
        ctx.send(
            poise::CreateReply::default()
                .content("No mute role exists.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    match member.remove_role(&ctx.serenity_context().http, role_id).await {
        Ok(()) => {
            ctx.say(format!("Unmuted {}.", member.user.name)).await?;
            log_action(
                &ctx.serenity_context().http,
                &ctx.data().configs,
                guild_id,
                &format!("{} unmuted {}.", ctx.author().name, member.user.name),
            )
            .await;
        }
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("Failed to unmute: {e}"))
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

// `minutes` is caller-supplied and unbounded; saturate rather than wrap so
// an absurd value means "effectively forever", not a near-immediate unmute.
fn mute_duration(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

fn find_mute_role(ctx: &Context<'_>) -> Option<serenity::RoleId> {
    ctx.guild()
        .and_then(|guild| guild.role_by_name(MUTE_ROLE_NAME).map(|role| role.id))
}

// Lazily create the shared mute role, denying send/react on every text
// channel that exists right now. Channels created later are not retrofitted.
async fn create_mute_role(
    ctx: &Context<'_>,
    guild_id: serenity::GuildId,
) -> Result<serenity::RoleId, serenity::Error> {
    let http = &ctx.serenity_context().http;
    let role = guild_id
        .create_role(http, serenity::EditRole::new().name(MUTE_ROLE_NAME))
        .await?;

    match guild_id.channels(http).await {
        Ok(channels) => {
            for channel in channels
                .values()
                .filter(|c| c.kind == serenity::ChannelType::Text)
            {
                let overwrite = serenity::PermissionOverwrite {
                    allow: serenity::Permissions::empty(),
                    deny: serenity::Permissions::SEND_MESSAGES
                        | serenity::Permissions::ADD_REACTIONS,
                    kind: serenity::PermissionOverwriteType::Role(role.id),
                };
                if let Err(e) = channel.create_permission(http, overwrite).await {
                    tracing::warn!("Failed to apply mute overwrite in #{}: {e}", channel.name);
                }
            }
        }
        Err(e) => tracing::warn!("Failed to list channels for mute overwrites: {e}"),
    }

    Ok(role.id)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mute_duration_converts_minutes_to_seconds() {
        assert_eq!(mute_duration(5), Duration::from_secs(300));
        assert_eq!(mute_duration(1), Duration::from_secs(60));
    }

    #[test]
    fn mute_duration_saturates_instead_of_wrapping() {
        assert_eq!(mute_duration(u64::MAX), Duration::from_secs(u64::MAX));
        assert_eq!(
            mute_duration(u64::MAX / 60 + 1),
            Duration::from_secs(u64::MAX)
        );
    }
}
