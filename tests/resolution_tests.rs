// Provider resolution tests - model-driven selection and the fallback chain,
// exercised against scripted in-memory providers.

use async_trait::async_trait;
use llm_gateway::GatewayError;
use llm_gateway::provider::{ProviderService, ServiceFactory};
use llm_gateway::types::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    EmbeddingRequest, EmbeddingResponse, MessageRole, ModelDescriptor, Usage,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Scripted provider: health is toggleable, and every health probe is
/// recorded in a shared log so tests can assert the candidate order.
struct StubProvider {
    id: String,
    healthy: Arc<AtomicBool>,
    probes: Arc<Mutex<Vec<String>>>,
}

impl StubProvider {
    fn ctor(
        id: &str,
        healthy: Arc<AtomicBool>,
        probes: Arc<Mutex<Vec<String>>>,
    ) -> llm_gateway::provider::ProviderCtor {
        let id = id.to_string();
        Arc::new(move || {
            Ok(Arc::new(StubProvider {
                id: id.clone(),
                healthy: Arc::clone(&healthy),
                probes: Arc::clone(&probes),
            }) as Arc<dyn ProviderService>)
        })
    }
}

#[async_trait]
impl ProviderService for StubProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GatewayError> {
        Ok(ChatCompletionResponse {
            id: request.request_id.clone(),
            model: request.model.clone(),
            provider: self.id.clone(),
            created: request.created.timestamp(),
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatMessage::new(MessageRole::Assistant, "stub"),
                finish_reason: Some("stop".to_string()),
            }],
            usage: Usage::new(1, 1),
        })
    }

    async fn create_embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, GatewayError> {
        Ok(EmbeddingResponse {
            model: request.model.clone(),
            provider: self.id.clone(),
            data: Vec::new(),
            usage: Usage::new(1, 0),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, GatewayError> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> bool {
        self.probes.lock().push(self.id.clone());
        self.healthy.load(Ordering::SeqCst)
    }
}

struct Harness {
    factory: ServiceFactory,
    probes: Arc<Mutex<Vec<String>>>,
    health: Vec<(String, Arc<AtomicBool>)>,
}

impl Harness {
    /// Factory with the given default/fallback set and one healthy stub per
    /// provider id. No model mappings are registered.
    fn new(default: &str, fallbacks: &[&str], providers: &[&str]) -> Self {
        let factory = ServiceFactory::new(
            default,
            fallbacks.iter().map(|id| id.to_string()).collect(),
        );
        let probes = Arc::new(Mutex::new(Vec::new()));
        let mut health = Vec::new();
        for id in providers {
            let healthy = Arc::new(AtomicBool::new(true));
            factory.register_service_class(
                id,
                StubProvider::ctor(id, Arc::clone(&healthy), Arc::clone(&probes)),
            );
            health.push((id.to_string(), healthy));
        }
        Self {
            factory,
            probes,
            health,
        }
    }

    fn set_healthy(&self, id: &str, healthy: bool) {
        let (_, flag) = self
            .health
            .iter()
            .find(|(known, _)| known == id)
            .expect("provider registered");
        flag.store(healthy, Ordering::SeqCst);
    }

    fn probe_log(&self) -> Vec<String> {
        self.probes.lock().clone()
    }
}

#[tokio::test]
async fn mapped_provider_wins_for_its_model() {
    let harness = Harness::new("openai", &[], &["ollama", "openai"]);
    harness
        .factory
        .register_provider_for_model("llama3.2:1b", "ollama");

    let service = harness
        .factory
        .get_service_for_model("llama3.2:1b", None)
        .await
        .expect("resolve");
    assert_eq!(service.id(), "ollama");
    assert_eq!(harness.probe_log(), vec!["ollama"]);
}

#[tokio::test]
async fn unmapped_model_falls_through_to_default() {
    let harness = Harness::new("ollama", &[], &["ollama"]);

    let service = harness
        .factory
        .get_service_for_model("totally-unknown", None)
        .await
        .expect("resolve");
    assert_eq!(service.id(), "ollama");
}

#[tokio::test]
async fn preferred_provider_is_tried_first_even_without_mapping() {
    let harness = Harness::new("ollama", &[], &["ollama", "openai"]);

    let service = harness
        .factory
        .get_service_for_model("gpt-4o", Some("openai"))
        .await
        .expect("resolve");
    assert_eq!(service.id(), "openai");
    assert_eq!(harness.probe_log(), vec!["openai"]);
}

#[tokio::test]
async fn preferred_provider_not_mapped_for_model_is_skipped_without_probe() {
    let harness = Harness::new("ollama", &[], &["ollama", "openai"]);
    harness
        .factory
        .register_provider_for_model("llama2", "ollama");

    let service = harness
        .factory
        .get_service_for_model("llama2", Some("openai"))
        .await
        .expect("resolve");
    assert_eq!(service.id(), "ollama");
    // openai was never probed: the mapping constrains the preferred provider.
    assert_eq!(harness.probe_log(), vec!["ollama"]);
}

#[tokio::test]
async fn unhealthy_candidates_advance_the_chain_in_order() {
    let harness = Harness::new("default", &["fb1", "fb2"], &["mapped", "default", "fb1", "fb2"]);
    harness
        .factory
        .register_provider_for_model("m", "mapped");
    harness.set_healthy("mapped", false);
    harness.set_healthy("default", false);
    harness.set_healthy("fb1", false);

    let service = harness
        .factory
        .get_service_for_model("m", Some("mapped"))
        .await
        .expect("resolve");
    assert_eq!(service.id(), "fb2");
    // Preferred, mapping, default, then fallbacks. The preferred provider is
    // also in the mapping, so it is probed twice; stages do not deduplicate.
    assert_eq!(
        harness.probe_log(),
        vec!["mapped", "mapped", "default", "fb1", "fb2"]
    );
}

#[tokio::test]
async fn exhaustion_with_mapping_reports_service_unavailable() {
    let harness = Harness::new("ollama", &[], &["ollama"]);
    harness
        .factory
        .register_provider_for_model("llama2", "ollama");
    harness.set_healthy("ollama", false);

    let result = harness.factory.get_service_for_model("llama2", None).await;
    assert!(matches!(
        result,
        Err(GatewayError::ServiceUnavailable { .. })
    ));
}

#[tokio::test]
async fn exhaustion_without_mapping_reports_model_not_found() {
    let harness = Harness::new("ollama", &[], &["ollama"]);
    harness.set_healthy("ollama", false);

    let result = harness
        .factory
        .get_service_for_model("no-such-model", None)
        .await;
    assert!(matches!(result, Err(GatewayError::ModelNotFound { .. })));
}

#[tokio::test]
async fn unregistered_provider_in_chain_counts_as_candidate_failure() {
    // "ghost" is mapped but has no constructor; resolution must advance to
    // the default instead of failing outright.
    let harness = Harness::new("ollama", &[], &["ollama"]);
    harness
        .factory
        .register_provider_for_model("llama2", "ghost");

    let service = harness
        .factory
        .get_service_for_model("llama2", None)
        .await
        .expect("resolve");
    assert_eq!(service.id(), "ollama");
}

#[tokio::test]
async fn registering_for_model_twice_is_idempotent() {
    let harness = Harness::new("ollama", &[], &["ollama"]);
    harness
        .factory
        .register_provider_for_model("llama2", "ollama");
    harness
        .factory
        .register_provider_for_model("llama2", "ollama");

    assert_eq!(
        harness.factory.model_map().compatible_providers("llama2"),
        vec!["ollama".to_string()]
    );
}

#[tokio::test]
async fn re_registering_a_service_class_evicts_the_memoized_instance() {
    let harness = Harness::new("ollama", &[], &["ollama"]);
    let first = harness.factory.get_service(Some("ollama")).expect("get");
    assert_eq!(first.id(), "ollama");

    let probes = Arc::new(Mutex::new(Vec::new()));
    harness.factory.register_service_class(
        "ollama",
        StubProvider::ctor("replacement", Arc::new(AtomicBool::new(true)), probes),
    );

    let second = harness.factory.get_service(Some("ollama")).expect("get");
    assert_eq!(second.id(), "replacement");
}

#[tokio::test]
async fn provider_ids_are_case_insensitive() {
    let harness = Harness::new("ollama", &[], &["ollama"]);
    harness
        .factory
        .register_provider_for_model("llama2", "OLLAMA");

    let service = harness
        .factory
        .get_service_for_model("llama2", Some("Ollama"))
        .await
        .expect("resolve");
    assert_eq!(service.id(), "ollama");
}
