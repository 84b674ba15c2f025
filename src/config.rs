//! Engine configuration.

use tracing::warn;

use crate::store::StoreBackend;

/// Runtime settings for the sync engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Location store implementation.
    pub store_backend: StoreBackend,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Render text without colour codes.
    pub raw_text: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::default(),
            log_filter: "info".to_string(),
            raw_text: false,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let store_backend = match lookup("MULTIWORLD_STORE_BACKEND") {
            Some(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}; using {} backend", e, defaults.store_backend);
                defaults.store_backend
            }),
            None => defaults.store_backend,
        };

        Self {
            store_backend,
            log_filter: lookup("MULTIWORLD_LOG").unwrap_or(defaults.log_filter),
            raw_text: lookup("MULTIWORLD_RAW_TEXT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.raw_text),
        }
    }
}
