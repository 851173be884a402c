//! Model→provider compatibility index.

use crate::config::ProviderConfig;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Ordered index from model identifier to compatible provider identifiers.
///
/// Built once by inverting the configured provider→models lists; insertion
/// order is preference order. Registration is an idempotent append and never
/// reorders existing entries. The lock is held only for the map operation
/// itself, so readers are never blocked across I/O.
#[derive(Debug, Default)]
pub struct ModelProviderMap {
    inner: RwLock<HashMap<String, Vec<String>>>,
}

impl ModelProviderMap {
    /// Invert the configured provider→models lists into model→providers.
    pub fn from_providers(providers: &[ProviderConfig]) -> Self {
        let mut inner: HashMap<String, Vec<String>> = HashMap::new();
        for provider in providers {
            for model in &provider.models {
                let entry = inner.entry(model.clone()).or_default();
                if !entry.contains(&provider.id) {
                    entry.push(provider.id.clone());
                }
            }
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// The configured provider sequence for `model`, or empty if none
    /// registered. Never fails.
    pub fn compatible_providers(&self, model: &str) -> Vec<String> {
        self.inner.read().get(model).cloned().unwrap_or_default()
    }

    /// Idempotent append: a provider already present for the model is left
    /// where it is; a new one goes to the end of the sequence.
    pub fn register_provider_for_model(&self, model: &str, provider_id: &str) {
        let provider_id = provider_id.to_lowercase();
        let mut inner = self.inner.write();
        let entry = inner.entry(model.to_string()).or_default();
        if !entry.contains(&provider_id) {
            entry.push(provider_id);
        }
    }
}
