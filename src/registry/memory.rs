//! In-memory registry backed by the config file's app table.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::registry::{AppConfig, AppRegistry, RegistryError};

/// Registry holding a swappable snapshot of the configured apps.
///
/// Readers load the current snapshot without locking; `replace` installs a
/// whole new table at once, so a lookup sees either the old or the new table.
pub struct StaticRegistry {
    apps: ArcSwap<HashMap<String, AppConfig>>,
}

impl StaticRegistry {
    /// Build a registry from a list of apps. Later duplicates win.
    pub fn from_apps(apps: impl IntoIterator<Item = AppConfig>) -> Self {
        Self {
            apps: ArcSwap::from_pointee(index(apps)),
        }
    }

    /// Atomically replace the app table.
    pub fn replace(&self, apps: impl IntoIterator<Item = AppConfig>) {
        let table = index(apps);
        tracing::info!(apps = table.len(), "App registry updated");
        self.apps.store(Arc::new(table));
    }

    /// Number of registered apps.
    pub fn len(&self) -> usize {
        self.apps.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::from_apps(Vec::new())
    }
}

fn index(apps: impl IntoIterator<Item = AppConfig>) -> HashMap<String, AppConfig> {
    apps.into_iter()
        .map(|app| (app.app_id.clone(), app))
        .collect()
}

#[async_trait]
impl AppRegistry for StaticRegistry {
    async fn lookup(&self, app_id: &str) -> Result<Option<AppConfig>, RegistryError> {
        Ok(self.apps.load().get(app_id).cloned())
    }
}
