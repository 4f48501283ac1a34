// JSON-file implementation of the guild config store.
//
// The whole map is read once at startup and rewritten in full after every
// mutation. One JSON object keyed by guild id; a missing file is an empty
// store, not an error.

use crate::core::guild_config::{ConfigStore, GuildConfig, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn load(&self) -> Result<HashMap<u64, GuildConfig>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let file = std::fs::File::open(&self.path)?;
        Ok(serde_json::from_reader(file)?)
    }

    async fn save(&self, configs: &HashMap<u64, GuildConfig>) -> Result<(), StoreError> {
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, configs)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path().join("configs.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs.json");

        let mut configs = HashMap::new();
        for guild_id in 1..=5u64 {
            let mut config = GuildConfig::with_prefix("?");
            config.mod_role = Some(format!("Mods {guild_id}"));
            config.log_channel = (guild_id % 2 == 0).then(|| "mod-log".to_string());
            configs.insert(guild_id, config);
        }

        let store = JsonConfigStore::new(&path);
        store.save(&configs).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, configs);

        // A second round trip must be lossless too.
        store.save(&loaded).await.unwrap();
        assert_eq!(store.load().await.unwrap(), configs);
    }

    #[tokio::test]
    async fn save_overwrites_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs.json");
        let store = JsonConfigStore::new(&path);

        let mut configs = HashMap::new();
        configs.insert(1, GuildConfig::with_prefix("?"));
        configs.insert(2, GuildConfig::with_prefix("!"));
        store.save(&configs).await.unwrap();

        configs.remove(&2);
        store.save(&configs).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key(&1));
    }
}
