// Per-guild configuration: the policy record every permission decision and
// prefix lookup reads from.
//
// The service owns the only in-memory copy of the config map. Mutations go
// through `set` and are followed by a full-store persist; a failed persist is
// logged and swallowed so the in-memory state stays authoritative for the
// rest of the process lifetime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One configuration record per guild. Created lazily with defaults on first
/// lookup and never deleted while the process runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub prefix: String,
    #[serde(default)]
    pub mod_role: Option<String>,
    #[serde(default)]
    pub log_channel: Option<String>,
    #[serde(default)]
    pub welcome_channel: Option<String>,
}

impl GuildConfig {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mod_role: None,
            log_channel: None,
            welcome_channel: None,
        }
    }
}

/// The set of keys a configuration mutation may touch. Anything else is not a
/// recognized field, enforced at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Prefix,
    ModRole,
    LogChannel,
    WelcomeChannel,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence port for the config map. Snapshot semantics: `load` reads the
/// whole store once at startup, `save` overwrites it in full.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<HashMap<u64, GuildConfig>, StoreError>;
    async fn save(&self, configs: &HashMap<u64, GuildConfig>) -> Result<(), StoreError>;
}

pub struct GuildConfigService<S: ConfigStore> {
    store: S,
    default_prefix: String,
    configs: RwLock<HashMap<u64, GuildConfig>>,
}

impl<S: ConfigStore> GuildConfigService<S> {
    /// Load the full store once; a failed load starts the process with an
    /// empty map rather than refusing to boot.
    pub async fn new(store: S, default_prefix: impl Into<String>) -> Self {
        let configs = match store.load().await {
            Ok(map) => map,
            Err(e) => {
                tracing::error!("Failed to load guild configs, starting empty: {e}");
                HashMap::new()
            }
        };

        Self {
            store,
            default_prefix: default_prefix.into(),
            configs: RwLock::new(configs),
        }
    }

    /// Fetch the config for a guild, creating (and persisting) a default
    /// record the first time the guild is seen. Never fails.
    pub async fn get(&self, guild_id: u64) -> GuildConfig {
        {
            let configs = self.configs.read().await;
            if let Some(config) = configs.get(&guild_id) {
                return config.clone();
            }
        }

        let mut configs = self.configs.write().await;
        // Another task may have inserted between the read and write lock.
        if let Some(config) = configs.get(&guild_id) {
            return config.clone();
        }

        let config = GuildConfig::with_prefix(&self.default_prefix);
        configs.insert(guild_id, config.clone());
        self.persist(&configs).await;
        config
    }

    /// Mutate one field and persist the whole store. The write lock is held
    /// across the persist so snapshots never interleave.
    pub async fn set(&self, guild_id: u64, field: ConfigField, value: String) {
        let mut configs = self.configs.write().await;
        let config = configs
            .entry(guild_id)
            .or_insert_with(|| GuildConfig::with_prefix(&self.default_prefix));

        match field {
            ConfigField::Prefix => config.prefix = value,
            ConfigField::ModRole => config.mod_role = Some(value),
            ConfigField::LogChannel => config.log_channel = Some(value),
            ConfigField::WelcomeChannel => config.welcome_channel = Some(value),
        }

        self.persist(&configs).await;
    }

    /// Effective prefix for a message: the guild's configured prefix, or the
    /// process default outside of guilds.
    pub async fn prefix_for(&self, guild_id: Option<u64>) -> String {
        match guild_id {
            Some(id) => self.get(id).await.prefix,
            None => self.default_prefix.clone(),
        }
    }

    // Persistence failure does not roll back the mutation; the next mutation
    // retries the write.
    async fn persist(&self, configs: &HashMap<u64, GuildConfig>) {
        if let Err(e) = self.store.save(configs).await {
            tracing::error!("Failed to save guild configs: {e}");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory store for testing, with a switch to simulate write failures.
    #[derive(Default)]
    struct MockStore {
        saved: RwLock<HashMap<u64, GuildConfig>>,
        save_count: AtomicUsize,
        fail_saves: AtomicBool,
    }

    #[async_trait]
    impl ConfigStore for MockStore {
        async fn load(&self) -> Result<HashMap<u64, GuildConfig>, StoreError> {
            Ok(self.saved.read().await.clone())
        }

        async fn save(&self, configs: &HashMap<u64, GuildConfig>) -> Result<(), StoreError> {
            self.save_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "disk full",
                )));
            }
            *self.saved.write().await = configs.clone();
            Ok(())
        }
    }

    #[tokio::test]
    async fn get_creates_defaults_for_unseen_guild() {
        let service = GuildConfigService::new(MockStore::default(), "?").await;

        let config = service.get(42).await;
        assert_eq!(config.prefix, "?");
        assert_eq!(config.mod_role, None);
        assert_eq!(config.log_channel, None);
        assert_eq!(config.welcome_channel, None);
    }

    #[tokio::test]
    async fn repeated_get_is_idempotent_and_persists_once() {
        let service = GuildConfigService::new(MockStore::default(), "?").await;

        let first = service.get(42).await;
        let second = service.get(42).await;
        assert_eq!(first, second);
        assert_eq!(service.store.save_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn set_mutates_field_and_persists_full_store() {
        let service = GuildConfigService::new(MockStore::default(), "?").await;

        service.set(1, ConfigField::Prefix, "!".into()).await;
        service.set(1, ConfigField::ModRole, "Mods".into()).await;
        service.set(2, ConfigField::LogChannel, "audit".into()).await;

        assert_eq!(service.get(1).await.prefix, "!");
        assert_eq!(service.get(1).await.mod_role.as_deref(), Some("Mods"));
        assert_eq!(service.get(2).await.log_channel.as_deref(), Some("audit"));

        let saved = service.store.saved.read().await;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[&1].mod_role.as_deref(), Some("Mods"));
    }

    #[tokio::test]
    async fn failed_persist_keeps_in_memory_mutation() {
        let store = MockStore::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        let service = GuildConfigService::new(store, "?").await;

        service.set(7, ConfigField::Prefix, "$".into()).await;

        assert_eq!(service.get(7).await.prefix, "$");
        assert!(service.store.saved.read().await.is_empty());
    }

    #[tokio::test]
    async fn prefix_for_falls_back_to_default_outside_guilds() {
        let service = GuildConfigService::new(MockStore::default(), "?").await;
        service.set(9, ConfigField::Prefix, "!".into()).await;

        assert_eq!(service.prefix_for(Some(9)).await, "!");
        assert_eq!(service.prefix_for(None).await, "?");
    }
}
