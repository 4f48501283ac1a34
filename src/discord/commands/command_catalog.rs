// Discord commands module.
// Each feature gets its own command file.

pub mod admin;

pub mod dm;

pub mod general;

pub mod moderation;

pub mod modset;

use crate::core::guild_config::GuildConfigService;
use crate::infra::guild_config::JsonConfigStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command invocation.
pub struct Data {
    pub configs: Arc<GuildConfigService<JsonConfigStore>>,
    /// When set, the `dm` command only accepts this caller.
    pub allowed_dm_user: Option<serenity::UserId>,
}
