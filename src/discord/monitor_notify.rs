// Discord-side implementations of the outage-notification chain.
//
// Order of preference (the chain runner stops at the first delivery):
// 1. A configured guild channel, resolved by explicit id, then by name.
// 2. A DM to every member whose username or display name matches the
//    configured fallback name, scanned across every guild we belong to.

use crate::core::monitor::{MonitorSettings, NotifyOutcome, OutageNotifier};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use std::sync::Arc;

pub struct GuildChannelNotifier {
    pub http: Arc<serenity::Http>,
    pub cache: Arc<serenity::Cache>,
    pub settings: MonitorSettings,
}

impl GuildChannelNotifier {
    // Channel resolution and the send-permission check run entirely against
    // the cache; no awaits while cache references are held.
    fn resolve_channel(&self) -> Option<serenity::ChannelId> {
        let guild_id = serenity::GuildId::new(self.settings.notify_guild_id?);
        let bot_id = self.cache.current_user().id;

        let Some(guild) = self.cache.guild(guild_id) else {
            tracing::warn!("Monitor: bot is not in guild {guild_id}");
            return None;
        };

        let channel = self
            .settings
            .notify_channel_id
            .map(serenity::ChannelId::new)
            .and_then(|id| guild.channels.get(&id))
            .or_else(|| {
                guild.channels.values().find(|c| {
                    c.kind == serenity::ChannelType::Text
                        && c.name == self.settings.notify_channel_name
                })
            });
        let Some(channel) = channel else {
            tracing::warn!("Monitor: could not find a sendable channel in guild {guild_id}");
            return None;
        };

        if let Some(me) = guild.members.get(&bot_id) {
            if !guild.user_permissions_in(channel, me).send_messages() {
                tracing::warn!("Monitor: missing send permission in #{}", channel.name);
                return None;
            }
        }

        Some(channel.id)
    }
}

#[async_trait]
impl OutageNotifier for GuildChannelNotifier {
    fn name(&self) -> &'static str {
        "guild-channel"
    }

    async fn notify(&self, reason: &str) -> NotifyOutcome {
        let Some(channel_id) = self.resolve_channel() else {
            return NotifyOutcome::Unavailable;
        };

        let content = format!(
            "⚠️ The monitored site {} appears to be down: {reason}",
            self.settings.target_url
        );
        match channel_id.say(&self.http, content).await {
            Ok(_) => {
                tracing::info!("Monitor: notified channel {channel_id} about site down");
                NotifyOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!("Monitor: failed to send channel notification: {e}");
                NotifyOutcome::Unavailable
            }
        }
    }
}

pub struct DmFallbackNotifier {
    pub http: Arc<serenity::Http>,
    pub cache: Arc<serenity::Cache>,
    pub target_url: String,
    pub display_name: Option<String>,
}

#[async_trait]
impl OutageNotifier for DmFallbackNotifier {
    fn name(&self) -> &'static str {
        "dm-fallback"
    }

    async fn notify(&self, reason: &str) -> NotifyOutcome {
        let Some(name) = self.display_name.as_deref() else {
            return NotifyOutcome::Unavailable;
        };

        let recipients: Vec<serenity::UserId> = {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for guild_id in self.cache.guilds() {
                let Some(guild) = self.cache.guild(guild_id) else {
                    continue;
                };
                for member in guild.members.values() {
                    if (member.user.name == name || member.display_name() == name)
                        && seen.insert(member.user.id)
                    {
                        out.push(member.user.id);
                    }
                }
            }
            out
        };

        let content = format!(
            "⚠️ The monitored site {} appears to be down: {reason}",
            self.target_url
        );
        let mut delivered = false;
        for user_id in recipients {
            match user_id.create_dm_channel(&self.http).await {
                Ok(channel) => match channel.id.say(&self.http, content.clone()).await {
                    Ok(_) => {
                        tracing::info!("Monitor: notified {user_id} by DM about site down");
                        delivered = true;
                    }
                    Err(e) => tracing::warn!("Monitor: failed to DM {user_id}: {e}"),
                },
                Err(e) => tracing::warn!("Monitor: failed to open a DM with {user_id}: {e}"),
            }
        }

        if delivered {
            NotifyOutcome::Delivered
        } else {
            tracing::warn!(
                "Monitor: could not find member '{name}' to DM about the outage; reason: {reason}"
            );
            NotifyOutcome::Unavailable
        }
    }
}
