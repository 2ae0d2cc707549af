//! Pipeline orchestration — wires C3 through C11 together exactly along
//! the spec §2 data-flow diagram. This is not a wire protocol: no HTTP or
//! MCP framing lives here, just a function composing the core components
//! for an in-process caller, in the explicit constructor-injected
//! `Arc<dyn Trait>` collaborator style of `application/context.rs`'s
//! `ContextService`.

use crate::budget::BudgetTracker;
use crate::compressor;
use crate::complexity::ComplexityAnalyzer;
use crate::config::{ComplexityWeights, RouterConfig, ScorerWeights};
use crate::error::Result;
use crate::intent::IntentDetector;
use crate::ports::EmbeddingProvider;
use crate::router::{Availability, ModelRouter};
use crate::scorer::Scorer;
use crate::selector::{self, ScoredChunk};
use crate::types::{CodeChunk, ModelChoice, ModelSpec, Query, QueryContext};
use crate::vector_store::{Filters, VectorStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything the pipeline produced for one request, at every stage, so
/// callers (and tests) can inspect intermediate state rather than only
/// the final compressed/model-routed answer.
pub struct PipelineOutput {
    pub selected: Vec<CodeChunk>,
    pub compressed: Vec<CodeChunk>,
    pub complexity: f32,
    pub model_choice: Option<ModelChoice>,
}

/// Constructor-injected collaborators for one pipeline run. Concrete
/// backends (which embedding provider, which vector store, which model
/// table) are chosen by the caller at startup, never resolved through an
/// ambient singleton (spec §9).
pub struct Pipeline<'a> {
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub vector_store: Arc<dyn VectorStore>,
    pub budget: &'a BudgetTracker,
    pub models: &'a [ModelSpec],
    pub router_config: RouterConfig,
    pub scorer_weights: ScorerWeights,
    pub complexity_weights: ComplexityWeights,
}

impl<'a> Pipeline<'a> {
    /// Run one query through the full context pipeline (spec §2 diagram):
    /// detect intent → embed → search → score → select → compress →
    /// analyze complexity → route to a model.
    ///
    /// `cancel` is checked at every suspension point (spec §5): the
    /// embedding call and every vector-store round trip race against it
    /// and return [`crate::error::Error::Cancelled`] promptly if it fires.
    pub async fn run(
        &self,
        query_text: &str,
        context: Option<&QueryContext>,
        provider_name: &str,
        availability: Availability,
        now_ms: i64,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput> {
        let intent_detector = IntentDetector::new();
        let intent = intent_detector.detect(query_text, context);

        let query_embedding = self.embedding.embed(query_text, cancel).await?;

        let mut query = Query::new(query_text, now_ms);
        query.embedding = Some(query_embedding.clone());
        query.current_file = context.and_then(|c| c.current_file.clone());
        query.intent = Some(intent.clone());

        let filters = Filters::default();
        let top_k = (intent.options.max_chunks * 3).max(20);
        let candidate_ids = self
            .vector_store
            .search(&query_embedding, top_k, 0.0, &filters, cancel)
            .await?;

        let scorer = Scorer::new(self.scorer_weights);
        let mut scored = Vec::with_capacity(candidate_ids.len());
        for candidate in candidate_ids {
            if let Some(chunk) = self.vector_store.get(&candidate.id, cancel).await? {
                let breakdown = scorer.score(&chunk, &query, context);
                scored.push(ScoredChunk { chunk, score: breakdown });
            }
        }

        let selected = selector::select(scored, intent.estimated_budget, &intent.options);

        let compressed: Vec<CodeChunk> = selected
            .iter()
            .map(|c| compressor::compress(c, intent.options.compression_level))
            .collect();

        let complexity_analyzer = ComplexityAnalyzer::new(self.complexity_weights);
        let complexity_factors = complexity_analyzer.analyze(query_text, context);

        let total_tokens: u32 = compressed.iter().map(|c| c.estimated_tokens).sum();
        let router = ModelRouter::new(self.router_config, self.models, self.budget);
        let model_choice = router.select(
            total_tokens,
            complexity_factors.score,
            availability,
            provider_name,
            now_ms,
        );

        if let Some(choice) = &model_choice {
            self.budget.track(provider_name, &choice.model, total_tokens as u64, now_ms);
        }

        Ok(PipelineOutput {
            selected,
            compressed,
            complexity: complexity_factors.score,
            model_choice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetConfig;
    use crate::error::Result as CoreResult;
    use crate::types::{ChunkKind, Language, ProviderTag};
    use crate::vector_store::InMemoryVectorStore;
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashMap};

    struct StubEmbedding;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedding {
        async fn embed(&self, text: &str, _cancel: &CancellationToken) -> CoreResult<Vec<f32>> {
            // Deterministic two-dimensional embedding: texts containing
            // "format_date" point at [1, 0], everything else at [0, 1].
            if text.to_lowercase().contains("format_date") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
        fn dimensions(&self) -> usize {
            2
        }
        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn chunk(id: &str, name: &str, embedding: Vec<f32>) -> CodeChunk {
        CodeChunk {
            id: id.to_string(),
            file_path: "src/utils/date.ts".into(),
            language: Language::Typescript,
            kind: ChunkKind::Function,
            name: name.to_string(),
            content: format!("function {name}() {{ return new Date(); }}"),
            start_line: 1,
            end_line: 3,
            symbols: BTreeSet::from([name.to_string()]),
            imports: BTreeSet::new(),
            last_modified: 0,
            embedding: Some(embedding),
            estimated_tokens: 20,
        }
    }

    /// Spec §8 scenario 1, end to end: explain query about `formatDate`
    /// against a tiny repo yields that chunk in the selection and a cheap
    /// model choice.
    #[tokio::test]
    async fn spec_scenario_one_end_to_end() {
        let cancel = CancellationToken::new();
        let store = Arc::new(InMemoryVectorStore::new());
        store.upsert(chunk("a", "formatDate", vec![1.0, 0.0]), &cancel).await.unwrap();
        store.upsert(chunk("b", "unrelated", vec![0.0, 1.0]), &cancel).await.unwrap();

        let models = vec![
            ModelSpec {
                name: "local-7b".into(),
                provider: ProviderTag::Local,
                context_window: 32_000,
                price_in_per_1m: 0.0,
                price_out_per_1m: 0.0,
                complexity_band: (0.0, 0.6),
            },
            ModelSpec {
                name: "haiku-class".into(),
                provider: ProviderTag::PaidCheap,
                context_window: 64_000,
                price_in_per_1m: 0.8,
                price_out_per_1m: 4.0,
                complexity_band: (0.0, 0.6),
            },
        ];
        let budget = BudgetTracker::new(vec![BudgetConfig::new("default", 10_000.0)], HashMap::new());

        let pipeline = Pipeline {
            embedding: Arc::new(StubEmbedding),
            vector_store: store,
            budget: &budget,
            models: &models,
            router_config: RouterConfig::default(),
            scorer_weights: ScorerWeights::default(),
            complexity_weights: ComplexityWeights::default(),
        };

        let output = pipeline
            .run(
                "Explain the `formatDate` function",
                None,
                "default",
                Availability { local: true, cloud_free: false },
                0,
                &cancel,
            )
            .await
            .unwrap();

        assert!(output.selected.iter().any(|c| c.name == "formatDate"));
        assert!(output.complexity < 0.5);
        let choice = output.model_choice.expect("a model should be selected");
        assert!(matches!(choice.provider, ProviderTag::Local | ProviderTag::PaidCheap));
    }

    /// spec §5: a pipeline run cancelled before it can complete returns
    /// `Cancelled` promptly rather than the successful output.
    #[tokio::test]
    async fn run_is_cancelled_promptly() {
        let store = Arc::new(InMemoryVectorStore::new());
        let models: Vec<ModelSpec> = Vec::new();
        let budget = BudgetTracker::new(vec![BudgetConfig::new("default", 10_000.0)], HashMap::new());
        let pipeline = Pipeline {
            embedding: Arc::new(StubEmbedding),
            vector_store: store,
            budget: &budget,
            models: &models,
            router_config: RouterConfig::default(),
            scorer_weights: ScorerWeights::default(),
            complexity_weights: ComplexityWeights::default(),
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = pipeline
            .run(
                "Explain the `formatDate` function",
                None,
                "default",
                Availability { local: true, cloud_free: false },
                0,
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(crate::error::Error::Cancelled)));
    }
}
