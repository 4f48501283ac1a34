// Administrator-only plumbing.

use crate::discord::commands::{Context, Error};

/// Force-sync slash/application commands with Discord (admin only).
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn synccommands(ctx: Context<'_>) -> Result<(), Error> {
    let commands = &ctx.framework().options().commands;
    match poise::builtins::register_globally(ctx.serenity_context(), commands).await {
        Ok(()) => {
            ctx.say("✅ Synced application (slash) commands with Discord.")
                .await?;
            tracing::info!("{} triggered command sync", ctx.author().name);
        }
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("Failed to sync commands: {e}"))
                    .ephemeral(true),
            )
            .await?;
            tracing::warn!("Manual command sync failed: {e}");
        }
    }
    Ok(())
}
