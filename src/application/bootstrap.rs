//! Component wiring from `AppConfig`.

use std::sync::Arc;

use super::{
    CacheLayer, DispatchCoordinator, DispatchLimits, DomainRouter, HandlerRegistry, HookPipeline,
    MemoryLimits, MemoryStore, Orchestrator, RequestGate, ResponseAggregator, SemanticTier,
};
use crate::adapters::feedback::{InMemoryFeedbackLog, JsonlFeedbackLog};
use crate::adapters::handlers::{CodingHandler, InferenceHandler, StaticCodeToolkit};
use crate::adapters::hooks::{CacheCheckHook, CacheStoreHook};
use crate::adapters::inference::{MockInferenceProvider, OpenAIConfig, OpenAIProvider};
use crate::adapters::multimodal::InferenceMultimodalAnalyzer;
use crate::adapters::rate_limiter::InMemoryRateLimiter;
use crate::adapters::routing::{
    InferenceDecomposer, InferenceDetector, KeywordDetector, RuleDecomposer,
};
use crate::adapters::safety::DenylistClassifier;
use crate::adapters::similarity::InMemorySimilarityIndex;
use crate::adapters::storage::{FileMemoryRepository, InMemoryMemoryRepository};
use crate::config::{
    AggregationMode, AppConfig, DecomposerKind, DetectorKind, FeedbackBackend, InferenceBackend,
    InferenceConfig, MemoryBackend,
};
use crate::domain::routing::DomainTag;
use crate::ports::{
    DomainDetector, DomainHandler, FeedbackRecorder, HookPhase, InferenceError, InferenceProvider, MemoryRepository,
    TaskDecomposer,
};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid denylist: {0}")]
    Denylist(#[from] regex::Error),

    #[error("inference provider: {0}")]
    Inference(#[from] InferenceError),
}

/// Provider selected by `inference.provider`.
pub fn build_provider(config: &InferenceConfig) -> Result<Arc<dyn InferenceProvider>, BootstrapError> {
    let provider: Arc<dyn InferenceProvider> = match config.provider {
        InferenceBackend::Mock => Arc::new(MockInferenceProvider::new()),
        InferenceBackend::OpenAI => {
            Arc::new(OpenAIProvider::new(OpenAIConfig::from_settings(config))?)
        }
    };
    Ok(provider)
}

fn handler(
    domain: DomainTag,
    provider: &Arc<dyn InferenceProvider>,
    config: &InferenceConfig,
) -> Arc<dyn DomainHandler> {
    Arc::new(InferenceHandler::for_domain(domain, provider.clone()).with_temperature(config.temperature))
}

/// Builds the full pipeline around `provider`, including the multimodal
/// analyzer, the feedback recorder and the cache hooks.
pub fn build_orchestrator(
    config: &AppConfig,
    provider: Arc<dyn InferenceProvider>,
) -> Result<Orchestrator, BootstrapError> {
    let classifier = Arc::new(DenylistClassifier::new(&config.gate.denylist)?);
    let limiter = Arc::new(InMemoryRateLimiter::from_config(&config.gate));
    let gate = RequestGate::new(classifier.clone(), limiter);

    let repository: Arc<dyn MemoryRepository> = match config.memory.backend {
        MemoryBackend::Memory => Arc::new(InMemoryMemoryRepository::new()),
        MemoryBackend::File => Arc::new(FileMemoryRepository::new(&config.memory.data_dir)),
    };
    let memory =
        MemoryStore::new(repository, MemoryLimits::from(&config.memory)).with_sanitizer(classifier);

    let coding = CodingHandler::new(provider.clone(), Arc::new(StaticCodeToolkit::new()));
    let registry = HandlerRegistry::new(handler(DomainTag::General, &provider, &config.inference))
        .register(DomainTag::Coding, Arc::new(coding))
        .register(
            DomainTag::Mathematics,
            handler(DomainTag::Mathematics, &provider, &config.inference),
        )
        .register(
            DomainTag::Vocabulary,
            handler(DomainTag::Vocabulary, &provider, &config.inference),
        )
        .register(
            DomainTag::Grammar,
            handler(DomainTag::Grammar, &provider, &config.inference),
        )
        .register(
            DomainTag::General,
            handler(DomainTag::General, &provider, &config.inference),
        );

    let detector: Arc<dyn DomainDetector> = match config.routing.detector {
        DetectorKind::Keyword => Arc::new(KeywordDetector::new()),
        DetectorKind::Inference => Arc::new(InferenceDetector::new(provider.clone())),
    };
    let decomposer: Arc<dyn TaskDecomposer> = match config.routing.decomposer {
        DecomposerKind::Rules => Arc::new(RuleDecomposer::new()),
        DecomposerKind::Inference => Arc::new(InferenceDecomposer::new(provider.clone())),
    };
    let router = DomainRouter::new(
        detector,
        decomposer,
        registry.domains(),
        config.routing.history_window,
    );
    let dispatcher = DispatchCoordinator::new(registry, DispatchLimits::from(&config.dispatch));

    let aggregator = match config.aggregation.mode {
        AggregationMode::Template => ResponseAggregator::template(),
        AggregationMode::Inference => ResponseAggregator::inference(provider.clone()),
    };

    let mut cache = CacheLayer::from_config(&config.cache);
    if config.cache.semantic_enabled {
        cache = cache.with_semantic(SemanticTier {
            index: Arc::new(InMemorySimilarityIndex::new()),
            embedder: provider.clone(),
            threshold: config.cache.semantic_threshold,
        });
    }
    let cache = Arc::new(cache);
    let hooks = HookPipeline::from_config(&config.hooks)
        .register(HookPhase::PreProcess, Arc::new(CacheCheckHook::new(cache.clone())))
        .register(HookPhase::PostProcess, Arc::new(CacheStoreHook::new(cache)));

    let mut orchestrator = Orchestrator::new(gate, memory, router, dispatcher, aggregator, hooks);
    if config.inference.multimodal_enabled {
        orchestrator = orchestrator.with_analyzer(Arc::new(InferenceMultimodalAnalyzer::new(provider)));
    }
    if config.feedback.enabled {
        let recorder: Arc<dyn FeedbackRecorder> = match config.feedback.backend {
            FeedbackBackend::Memory => Arc::new(InMemoryFeedbackLog::new()),
            FeedbackBackend::File => Arc::new(JsonlFeedbackLog::new(&config.feedback.data_dir)),
        };
        orchestrator = orchestrator.with_feedback(recorder);
    }

    tracing::info!(
        provider = ?config.inference.provider,
        memory_backend = ?config.memory.backend,
        detector = ?config.routing.detector,
        decomposer = ?config.routing.decomposer,
        aggregation = ?config.aggregation.mode,
        semantic_cache = config.cache.semantic_enabled,
        multimodal = config.inference.multimodal_enabled,
        feedback = ?config.feedback.enabled.then_some(config.feedback.backend),
        "orchestrator assembled"
    );
    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn mock_provider_by_default() {
        let provider = build_provider(&InferenceConfig::default()).unwrap();
        assert_eq!(provider.provider_info().name, "mock");
    }

    #[test]
    fn openai_provider_when_configured() {
        let config = InferenceConfig {
            provider: InferenceBackend::OpenAI,
            api_key: Some(Secret::new("sk-test".to_string())),
            ..Default::default()
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.provider_info().name, "openai");
    }

    #[tokio::test]
    async fn empty_denylist_admits_everything() {
        let mut config = AppConfig::default();
        config.gate.denylist = vec![" ".to_string()];
        let orchestrator =
            build_orchestrator(&config, Arc::new(MockInferenceProvider::new())).unwrap();

        let request = crate::domain::orchestration::OrchestrationRequest::new(
            "how to hack a keyboard layout",
            crate::domain::orchestration::RequestContext::new(
                crate::domain::foundation::UserId::new("u").unwrap(),
                crate::domain::foundation::SessionId::new("s").unwrap(),
            ),
        )
        .unwrap();
        assert!(orchestrator.process(&request).await.is_completed());
    }

    #[tokio::test]
    async fn file_feedback_backend_writes_daily_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.feedback.backend = FeedbackBackend::File;
        config.feedback.data_dir = dir.path().join("feedback");
        let orchestrator =
            build_orchestrator(&config, Arc::new(MockInferenceProvider::new())).unwrap();

        let request = crate::domain::orchestration::OrchestrationRequest::new(
            "Define serendipity",
            crate::domain::orchestration::RequestContext::new(
                crate::domain::foundation::UserId::new("u").unwrap(),
                crate::domain::foundation::SessionId::new("s").unwrap(),
            ),
        )
        .unwrap();
        let response = orchestrator.process(&request).await;

        assert!(response.trace.iter().any(|s| s.label == "feedback.recorded"));
        let files: Vec<_> = std::fs::read_dir(dir.path().join("feedback")).unwrap().collect();
        assert_eq!(files.len(), 1);
    }
}
