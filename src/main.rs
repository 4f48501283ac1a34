// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (files, HTTP)
// - `discord/` = Discord-specific adapters (commands, notifiers)
//
// This file's job is to:
// 1. Load configuration from the environment
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Spawn the background availability monitor

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::guild_config::GuildConfigService;
use crate::core::monitor::{MonitorService, MonitorSettings, OutageNotifier};
use crate::discord::monitor_notify::{DmFallbackNotifier, GuildChannelNotifier};
use crate::discord::Data;
use crate::infra::guild_config::JsonConfigStore;
use crate::infra::monitor::HttpProber;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PREFIX: &str = "?";
const MONITOR_TARGET_URL: &str = "https://portfolio.aetherassembly.org";
const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .filter(|&value| value != 0)
}

fn monitor_settings_from_env() -> MonitorSettings {
    let interval_minutes = std::env::var("WEBSITE_MONITOR_INTERVAL_MINUTES")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|&minutes| minutes >= 1)
        .unwrap_or(1);

    MonitorSettings {
        target_url: MONITOR_TARGET_URL.to_string(),
        interval: Duration::from_secs(interval_minutes * 60),
        probe_timeout: PROBE_TIMEOUT,
        notify_guild_id: env_u64("MONITOR_NOTIFY_GUILD_ID"),
        notify_channel_id: env_u64("MONITOR_NOTIFY_CHANNEL_ID"),
        notify_channel_name: std::env::var("MONITOR_NOTIFY_CHANNEL_NAME")
            .unwrap_or_else(|_| "general".to_string()),
        fallback_display_name: std::env::var("MONITOR_FALLBACK_USER_NAME").ok(),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // The token is the only setting we refuse to run without.
    let token = std::env::var("DISCORD_TOKEN")
        .expect("Missing DISCORD_TOKEN environment variable! Set it and restart.");

    let default_prefix = std::env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let allowed_dm_user = env_u64("ALLOWED_DM_USER_ID").map(serenity::UserId::new);
    let monitor_settings = monitor_settings_from_env();

    // Keep runtime state in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The config service is the single owner of per-guild policy; everything
    // else borrows it through `Data`.

    let config_store = JsonConfigStore::new(format!("{data_dir}/configs.json"));
    let configs = Arc::new(GuildConfigService::new(config_store, default_prefix).await);

    let data = Data {
        configs: Arc::clone(&configs),
        allowed_dm_user,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read prefix commands
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::general::ping(),
                discord::commands::general::roll(),
                discord::commands::general::quote(),
                discord::commands::general::remind(),
                discord::commands::dm::dm(),
                discord::commands::moderation::purge(),
                discord::commands::moderation::kick(),
                discord::commands::moderation::ban(),
                discord::commands::moderation::mute(),
                discord::commands::moderation::unmute(),
                discord::commands::modset::modset(),
                discord::commands::admin::synccommands(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                // Per-guild prefix from the config store; DMs use the default.
                dynamic_prefix: Some(|ctx| {
                    Box::pin(async move {
                        let guild_id = ctx.guild_id.map(|id| id.get());
                        Ok(Some(ctx.data.configs.prefix_for(guild_id).await))
                    })
                }),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is online as {}", ready.user.name);

                // Publish the structured-command set (slash surface).
                match poise::builtins::register_globally(ctx, &framework.options().commands).await
                {
                    Ok(()) => tracing::info!("Synced application (slash) commands with Discord"),
                    Err(e) => tracing::warn!("Failed to sync application commands: {e}"),
                }

                // Availability monitor: exactly one loop for the process
                // lifetime, detached like the scheduler's timers.
                let prober = HttpProber::new(monitor_settings.probe_timeout)
                    .expect("Failed to build monitor HTTP client");
                let monitor = MonitorService::new(monitor_settings.clone(), prober);
                let notifiers: Vec<Box<dyn OutageNotifier>> = vec![
                    Box::new(GuildChannelNotifier {
                        http: ctx.http.clone(),
                        cache: ctx.cache.clone(),
                        settings: monitor_settings.clone(),
                    }),
                    Box::new(DmFallbackNotifier {
                        http: ctx.http.clone(),
                        cache: ctx.cache.clone(),
                        target_url: monitor_settings.target_url.clone(),
                        display_name: monitor_settings.fallback_display_name.clone(),
                    }),
                ];
                tokio::spawn(async move {
                    monitor.run(notifiers).await;
                });
                tracing::info!("Started website monitor task");

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
