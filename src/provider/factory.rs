//! Service factory - provider registration, lazy construction, and
//! model-driven resolution with fallback.

use super::clients::{OllamaClient, OpenAIClient};
use super::model_map::ModelProviderMap;
use super::traits::ProviderService;
use crate::config::{GatewayConfig, ProviderConfig};
use crate::error::GatewayError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tracing::{debug, warn};

/// Constructor closure for lazy provider instantiation.
pub type ProviderCtor = Arc<dyn Fn() -> Result<Arc<dyn ProviderService>, GatewayError> + Send + Sync>;

/// Resolve an API key from the environment variable named in the config.
pub fn resolve_api_key(provider: &str, env_var: Option<&str>) -> Option<String> {
    let Some(raw) = env_var.map(str::trim) else {
        return None;
    };
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for the built-in provider clients.
///
/// Supported types:
/// - `ollama`, `localai` → Ollama format
/// - Others → OpenAI-compatible format (default)
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: &ProviderConfig) -> Arc<dyn ProviderService> {
        if config.is_ollama() {
            Arc::new(OllamaClient::from_config(config))
        } else {
            Arc::new(OpenAIClient::from_config(config))
        }
    }
}

/// Central provider registry and resolver.
///
/// Constructed once at process start and shared behind an `Arc`; there is no
/// hidden global state. Provider instances are built lazily from registered
/// constructors and memoized, so concurrent first-use of an id yields exactly
/// one instance.
pub struct ServiceFactory {
    default_provider: String,
    fallback_providers: Vec<String>,
    model_map: ModelProviderMap,
    provider_configs: HashMap<String, ProviderConfig>,
    constructors: RwLock<HashMap<String, ProviderCtor>>,
    instances: RwLock<HashMap<String, Arc<dyn ProviderService>>>,
}

impl ServiceFactory {
    /// Empty factory with a default provider and fallback sequence.
    /// Providers are added through `register_service_class`.
    pub fn new(default_provider: impl Into<String>, fallback_providers: Vec<String>) -> Self {
        Self {
            default_provider: default_provider.into().to_lowercase(),
            fallback_providers: fallback_providers
                .into_iter()
                .map(|id| id.to_lowercase())
                .collect(),
            model_map: ModelProviderMap::default(),
            provider_configs: HashMap::new(),
            constructors: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Build the factory from loaded configuration: registers a built-in
    /// constructor per configured provider and inverts the model mapping.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut factory = Self::new(
            config.default_provider.clone(),
            config.fallback_providers.clone(),
        );
        factory.model_map = ModelProviderMap::from_providers(&config.providers);
        factory.provider_configs = config
            .providers
            .iter()
            .map(|p| (p.id.clone(), p.clone()))
            .collect();
        for provider in &config.providers {
            let cfg = provider.clone();
            factory.register_service_class(&provider.id, Arc::new(move || Ok(ProviderFactory::create(&cfg))));
        }
        factory
    }

    pub fn model_map(&self) -> &ModelProviderMap {
        &self.model_map
    }

    /// Register a constructor for lazy instantiation. Re-registration under
    /// the same id replaces the constructor and evicts any memoized instance
    /// built from the old one.
    pub fn register_service_class(&self, provider_id: &str, ctor: ProviderCtor) {
        let id = provider_id.to_lowercase();
        self.constructors.write().insert(id.clone(), ctor);
        self.instances.write().remove(&id);
    }

    /// Register a provider as compatible with a model. The mapping append is
    /// idempotent; a provider id unknown to the registry gets a built-in
    /// constructor if configuration exists for it, without a health check.
    pub fn register_provider_for_model(&self, model: &str, provider_id: &str) {
        let id = provider_id.to_lowercase();
        self.model_map.register_provider_for_model(model, &id);

        let known = self.constructors.read().contains_key(&id);
        if !known {
            if let Some(cfg) = self.provider_configs.get(&id) {
                let cfg = cfg.clone();
                debug!(provider = id.as_str(), "Registering constructor for mapped provider");
                self.register_service_class(&id, Arc::new(move || Ok(ProviderFactory::create(&cfg))));
            }
        }
    }

    /// Get the named provider, or the configured default when `None`.
    /// Instances are constructed lazily and memoized; the write lock is held
    /// across construction so concurrent first-use builds exactly one.
    pub fn get_service(
        &self,
        provider_id: Option<&str>,
    ) -> Result<Arc<dyn ProviderService>, GatewayError> {
        let id = provider_id.unwrap_or(&self.default_provider).to_lowercase();

        if let Some(service) = self.instances.read().get(&id) {
            return Ok(Arc::clone(service));
        }

        let mut instances = self.instances.write();
        if let Some(service) = instances.get(&id) {
            return Ok(Arc::clone(service));
        }

        let ctor = self
            .constructors
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::unavailable(format!("provider '{id}' is not registered")))?;
        let service = ctor()?;
        instances.insert(id, Arc::clone(&service));
        Ok(service)
    }

    /// Resolve a provider for `model`, first success wins:
    ///
    /// 1. the preferred provider, when given and either mapped for the model
    ///    or the model has no mapping at all (no mapping = no constraint);
    /// 2. each provider in the model's mapping, in order;
    /// 3. the configured default provider;
    /// 4. each provider in the configured fallback sequence, in order.
    ///
    /// Candidate failures (unavailable, provider error, timeout,
    /// provider-reported unknown model) advance the loop; anything else
    /// propagates immediately. Exhaustion yields `ModelNotFound` when the
    /// model had no mapping, `ServiceUnavailable` otherwise.
    pub async fn get_service_for_model(
        &self,
        model: &str,
        preferred_provider: Option<&str>,
    ) -> Result<Arc<dyn ProviderService>, GatewayError> {
        let candidates = self.model_map.compatible_providers(model);

        if let Some(preferred) = preferred_provider {
            let preferred = preferred.to_lowercase();
            if candidates.is_empty() || candidates.contains(&preferred) {
                match self.try_candidate(&preferred).await {
                    Ok(service) => return Ok(service),
                    Err(error) if error.is_candidate_failure() => {
                        warn!(provider = preferred.as_str(), %error, "Preferred provider unavailable, trying others");
                    }
                    Err(error) => return Err(error),
                }
            } else {
                debug!(
                    provider = preferred.as_str(),
                    model, "Preferred provider not mapped for model, skipping"
                );
            }
        }

        for provider_id in &candidates {
            match self.try_candidate(provider_id).await {
                Ok(service) => return Ok(service),
                Err(error) if error.is_candidate_failure() => {
                    warn!(provider = provider_id.as_str(), model, %error, "Mapped provider unavailable, trying others");
                }
                Err(error) => return Err(error),
            }
        }

        match self.try_candidate(&self.default_provider).await {
            Ok(service) => return Ok(service),
            Err(error) if error.is_candidate_failure() => {
                warn!(provider = self.default_provider.as_str(), %error, "Default provider unavailable, trying fallbacks");
            }
            Err(error) => return Err(error),
        }

        for provider_id in &self.fallback_providers {
            match self.try_candidate(provider_id).await {
                Ok(service) => return Ok(service),
                Err(error) if error.is_candidate_failure() => {
                    warn!(provider = provider_id.as_str(), model, %error, "Fallback provider unavailable");
                }
                Err(error) => return Err(error),
            }
        }

        if candidates.is_empty() {
            Err(GatewayError::model_not_found(model))
        } else {
            Err(GatewayError::unavailable(format!(
                "no configured provider for model '{model}' could be reached"
            )))
        }
    }

    /// All constructible providers in the default+fallback set, deduplicated,
    /// skipping any that cannot be built.
    pub fn services(&self) -> Vec<Arc<dyn ProviderService>> {
        let mut seen = vec![self.default_provider.clone()];
        for id in &self.fallback_providers {
            if !seen.contains(id) {
                seen.push(id.clone());
            }
        }
        seen.iter()
            .filter_map(|id| self.get_service(Some(id)).ok())
            .collect()
    }

    async fn try_candidate(
        &self,
        provider_id: &str,
    ) -> Result<Arc<dyn ProviderService>, GatewayError> {
        let service = self.get_service(Some(provider_id))?;
        if service.health_check().await {
            Ok(service)
        } else {
            Err(GatewayError::unavailable(format!(
                "provider '{provider_id}' failed its health check"
            )))
        }
    }
}
