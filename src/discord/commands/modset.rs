// Per-guild policy settings. Viewing is open to everyone; every mutation
// requires Manage Guild (a narrower check than the general moderation gate,
// independent of the configured mod role).

use crate::core::guild_config::ConfigField;
use crate::discord::commands::{Context, Error};

/// View or change this server's bot settings.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    subcommands("view", "prefix", "modrole", "logchannel", "welcome")
)]
pub async fn modset(ctx: Context<'_>) -> Result<(), Error> {
    // Bare prefix invocation (no subcommand) shows the current settings.
    show_settings(ctx).await
}

/// Show the current settings.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn view(ctx: Context<'_>) -> Result<(), Error> {
    show_settings(ctx).await
}

async fn show_settings(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let config = ctx.data().configs.get(guild_id.get()).await;

    ctx.say(format!(
        "Prefix: {}\nMod role: {}\nLog channel: {}\nWelcome channel: {}",
        config.prefix,
        config.mod_role.as_deref().unwrap_or("None"),
        config.log_channel.as_deref().unwrap_or("None"),
        config.welcome_channel.as_deref().unwrap_or("None"),
    ))
    .await?;
    Ok(())
}

/// Set the text-command prefix for this server.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn prefix(
    ctx: Context<'_>,
    #[description = "New command prefix"] prefix: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    ctx.data()
        .configs
        .set(guild_id.get(), ConfigField::Prefix, prefix.clone())
        .await;
    ctx.say(format!("Prefix set to {prefix}")).await?;
    Ok(())
}

/// Set the role name that grants access to moderation commands.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn modrole(
    ctx: Context<'_>,
    #[description = "Role name that grants moderation access"]
    #[rest]
    role_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    ctx.data()
        .configs
        .set(guild_id.get(), ConfigField::ModRole, role_name.clone())
        .await;
    ctx.say(format!("Mod role set to {role_name}")).await?;
    Ok(())
}

/// Set the channel name that receives moderation audit lines.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn logchannel(
    ctx: Context<'_>,
    #[description = "Channel name for the action log"] channel_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    ctx.data()
        .configs
        .set(guild_id.get(), ConfigField::LogChannel, channel_name.clone())
        .await;
    ctx.say(format!("Log channel set to {channel_name}")).await?;
    Ok(())
}

/// Set the channel name used for welcome messages.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn welcome(
    ctx: Context<'_>,
    #[description = "Channel name for welcome messages"] channel_name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    ctx.data()
        .configs
        .set(guild_id.get(), ConfigField::WelcomeChannel, channel_name.clone())
        .await;
    ctx.say(format!("Welcome channel set to {channel_name}")).await?;
    Ok(())
}
