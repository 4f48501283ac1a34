// Best-effort audit sink: one human-readable line per privileged action,
// sent to the guild's configured log channel. Never fails the caller.

use crate::core::guild_config::{ConfigStore, GuildConfigService};
use poise::serenity_prelude as serenity;

pub async fn log_action<S: ConfigStore>(
    http: &serenity::Http,
    configs: &GuildConfigService<S>,
    guild_id: serenity::GuildId,
    description: &str,
) {
    let config = configs.get(guild_id.get()).await;
    let Some(channel_name) = config.log_channel else {
        return;
    };

    let channels = match guild_id.channels(http).await {
        Ok(channels) => channels,
        Err(e) => {
            tracing::debug!("Action log: failed to list channels for guild {guild_id}: {e}");
            return;
        }
    };

    let Some(channel) = channels
        .values()
        .find(|c| c.kind == serenity::ChannelType::Text && c.name == channel_name)
    else {
        return;
    };

    if let Err(e) = channel.id.say(http, description).await {
        tracing::debug!("Action log: failed to send to #{channel_name}: {e}");
    }
}
