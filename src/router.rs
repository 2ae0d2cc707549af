//! C11 — Model Router.
//!
//! Picks the cheapest viable model for a request via the five-rung
//! decision ladder of spec §4.9. Grounded on
//! `adapters/providers/routing/mod.rs`'s `ProviderRouter` composition
//! idiom (a router struct holding injected collaborators) but stripped of
//! the health-monitor/circuit-breaker/failover machinery there, which is
//! HTTP-provider resilience plumbing outside PRISM's core scope; only the
//! routing-decision shape and the dependency on a cost/budget tracker
//! survive, pointed here at [`crate::budget::BudgetTracker`].

use crate::budget::BudgetTracker;
use crate::config::RouterConfig;
use crate::types::{ModelChoice, ModelSpec, ProviderTag};

/// Availability of each provider tier, as observed by the caller (e.g. a
/// local model server, a cloud-free-tier endpoint). The Router makes pure
/// decisions; it does not itself probe providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Availability {
    pub local: bool,
    pub cloud_free: bool,
}

pub struct ModelRouter<'a> {
    config: RouterConfig,
    /// Models configured at startup (spec §4.9), in any order; the ladder
    /// rungs filter by `provider` and `fits_complexity`/`max_tokens`.
    models: &'a [ModelSpec],
    budget: &'a BudgetTracker,
}

impl<'a> ModelRouter<'a> {
    pub fn new(config: RouterConfig, models: &'a [ModelSpec], budget: &'a BudgetTracker) -> Self {
        Self { config, models, budget }
    }

    fn models_for(&self, provider: ProviderTag) -> impl Iterator<Item = &'a ModelSpec> {
        self.models.iter().filter(move |m| m.provider == provider)
    }

    /// Cheapest model of `provider` whose `context_window >= tokens` and
    /// whose own `complexity_band` covers `complexity`, preferring the
    /// lowest estimated cost (spec §4.9: "if a selected model's
    /// max_tokens < tokens, step to the next rule"). A rung's own
    /// ceilings in [`RouterConfig`] gate whether the rung is tried at all;
    /// this additionally skips any individual model in that rung whose
    /// configured band excludes the query's complexity.
    fn cheapest_fitting(&self, provider: ProviderTag, tokens: u32, complexity: f32) -> Option<&'a ModelSpec> {
        self.models_for(provider)
            .filter(|m| m.context_window >= tokens && m.fits_complexity(complexity))
            .min_by(|a, b| {
                estimate_cost(a, tokens)
                    .partial_cmp(&estimate_cost(b, tokens))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// `select(tokens, complexity, availability, budget) → ModelChoice`
    /// (spec §4.9). `provider_name` identifies the budget-tracker bucket
    /// for cloud-free / paid tiers; `now_ms` is threaded through for the
    /// same testability reason the Budget Tracker takes it explicitly.
    pub fn select(
        &self,
        tokens: u32,
        complexity: f32,
        availability: Availability,
        provider_name: &str,
        now_ms: i64,
    ) -> Option<ModelChoice> {
        // Rung 1: local, if it fits and is cheap enough.
        if tokens < self.config.local_token_ceiling
            && complexity < self.config.local_complexity_ceiling
            && availability.local
        {
            if let Some(model) = self.cheapest_fitting(ProviderTag::Local, tokens, complexity) {
                return Some(ModelChoice {
                    model: model.name.clone(),
                    provider: ProviderTag::Local,
                    estimated_cost: 0.0,
                    reason: "local model available within token and complexity ceiling".into(),
                });
            }
        }

        // Rung 2: cloud-free, if available, affordable, and within bounds.
        if availability.cloud_free
            && tokens < self.config.cloud_free_token_ceiling
            && complexity < self.config.cloud_free_complexity_ceiling
        {
            if let Some(model) = self.cheapest_fitting(ProviderTag::CloudFree, tokens, complexity) {
                if self.budget.can_afford(provider_name, &model.name, tokens as u64, now_ms) {
                    return Some(ModelChoice {
                        model: model.name.clone(),
                        provider: ProviderTag::CloudFree,
                        estimated_cost: 0.0,
                        reason: "cloud-free tier available and within daily budget".into(),
                    });
                }
            }
        }

        // Rung 3: cheap paid (Haiku-class).
        if tokens < self.config.cheap_token_ceiling && complexity < self.config.cheap_complexity_ceiling {
            if let Some(model) = self.cheapest_fitting(ProviderTag::PaidCheap, tokens, complexity) {
                return Some(self.paid_choice(model, tokens, "cheap paid tier fits token and complexity bounds"));
            }
        }

        // Rung 4: balanced paid (Sonnet-class).
        if tokens < self.config.balanced_token_ceiling {
            if let Some(model) = self.cheapest_fitting(ProviderTag::PaidBalanced, tokens, complexity) {
                return Some(self.paid_choice(model, tokens, "balanced paid tier fits token bound"));
            }
        }

        // Rung 5: premium paid (Opus-class) — last rung, catches everything else.
        self.cheapest_fitting(ProviderTag::PaidPremium, tokens, complexity)
            .map(|model| self.paid_choice(model, tokens, "premium tier: exceeds all cheaper rungs' bounds"))
    }

    fn paid_choice(&self, model: &ModelSpec, tokens: u32, reason: &str) -> ModelChoice {
        ModelChoice {
            model: model.name.clone(),
            provider: model.provider,
            estimated_cost: estimate_cost(model, tokens),
            reason: reason.to_string(),
        }
    }
}

/// 70/30 input/output split cost estimate (spec §4.9).
fn estimate_cost(model: &ModelSpec, tokens: u32) -> f64 {
    let tokens = tokens as f64;
    0.7 * tokens * model.price_in_per_1m / 1_000_000.0 + 0.3 * tokens * model.price_out_per_1m / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetConfig;
    use std::collections::HashMap;

    fn model_table() -> Vec<ModelSpec> {
        vec![
            ModelSpec {
                name: "local-7b".into(),
                provider: ProviderTag::Local,
                context_window: 32_000,
                price_in_per_1m: 0.0,
                price_out_per_1m: 0.0,
                complexity_band: (0.0, 0.6),
            },
            ModelSpec {
                name: "cloud_free_8b".into(),
                provider: ProviderTag::CloudFree,
                context_window: 64_000,
                price_in_per_1m: 0.0,
                price_out_per_1m: 0.0,
                complexity_band: (0.0, 0.7),
            },
            ModelSpec {
                name: "haiku-class".into(),
                provider: ProviderTag::PaidCheap,
                context_window: 64_000,
                price_in_per_1m: 0.8,
                price_out_per_1m: 4.0,
                complexity_band: (0.0, 0.6),
            },
            ModelSpec {
                name: "sonnet-class".into(),
                provider: ProviderTag::PaidBalanced,
                context_window: 200_000,
                price_in_per_1m: 3.0,
                price_out_per_1m: 15.0,
                complexity_band: (0.0, 1.0),
            },
            ModelSpec {
                name: "opus-class".into(),
                provider: ProviderTag::PaidPremium,
                context_window: 200_000,
                price_in_per_1m: 15.0,
                price_out_per_1m: 75.0,
                complexity_band: (0.0, 1.0),
            },
        ]
    }

    fn budget() -> BudgetTracker {
        let mut cost_table = HashMap::new();
        cost_table.insert("cloud_free_8b".to_string(), 0.0);
        BudgetTracker::new(vec![BudgetConfig::new("default", 10_000.0)], cost_table)
    }

    /// Spec §8 scenario 1: small token count, low complexity, local
    /// available → local model, cost 0.
    #[test]
    fn spec_scenario_one_picks_local() {
        let models = model_table();
        let b = budget();
        let router = ModelRouter::new(RouterConfig::default(), &models, &b);
        let choice = router
            .select(2_000, 0.2, Availability { local: true, cloud_free: false }, "default", 0)
            .unwrap();
        assert_eq!(choice.provider, ProviderTag::Local);
        assert_eq!(choice.estimated_cost, 0.0);
    }

    /// Spec §8 scenario 2: high complexity (>=0.7) → Sonnet-class or
    /// better, not local or cloud-free.
    #[test]
    fn spec_scenario_two_high_complexity_skips_cheap_tiers() {
        let models = model_table();
        let b = budget();
        let router = ModelRouter::new(RouterConfig::default(), &models, &b);
        let choice = router
            .select(4_000, 0.75, Availability { local: true, cloud_free: true }, "default", 0)
            .unwrap();
        assert!(matches!(
            choice.provider,
            ProviderTag::PaidBalanced | ProviderTag::PaidPremium
        ));
    }

    #[test]
    fn falls_through_to_cheap_paid_when_nothing_local_or_free_available() {
        let models = model_table();
        let b = budget();
        let router = ModelRouter::new(RouterConfig::default(), &models, &b);
        let choice = router
            .select(5_000, 0.3, Availability::default(), "default", 0)
            .unwrap();
        assert_eq!(choice.provider, ProviderTag::PaidCheap);
    }

    #[test]
    fn falls_through_to_premium_for_very_large_token_counts() {
        let models = model_table();
        let b = budget();
        let router = ModelRouter::new(RouterConfig::default(), &models, &b);
        let choice = router
            .select(150_000, 0.2, Availability::default(), "default", 0)
            .unwrap();
        assert_eq!(choice.provider, ProviderTag::PaidPremium);
    }

    #[test]
    fn router_viability_selected_model_context_window_covers_tokens() {
        let models = model_table();
        let b = budget();
        let router = ModelRouter::new(RouterConfig::default(), &models, &b);
        for (tokens, complexity) in [(1_000, 0.1), (10_000, 0.5), (60_000, 0.3), (120_000, 0.9)] {
            let choice = router
                .select(tokens, complexity, Availability { local: true, cloud_free: true }, "default", 0)
                .unwrap();
            let spec = models.iter().find(|m| m.name == choice.model).unwrap();
            assert!(spec.context_window >= tokens, "model {} too small for {tokens} tokens", spec.name);
        }
    }

    /// A rung can be token-eligible yet have its only candidate model's
    /// `complexity_band` exclude the query's complexity; the router must
    /// skip that model and fall through rather than return it anyway.
    #[test]
    fn model_whose_complexity_band_excludes_the_query_is_skipped() {
        let models = vec![
            ModelSpec {
                name: "narrow-cheap".into(),
                provider: ProviderTag::PaidCheap,
                context_window: 64_000,
                price_in_per_1m: 0.8,
                price_out_per_1m: 4.0,
                complexity_band: (0.0, 0.3),
            },
            ModelSpec {
                name: "sonnet-class".into(),
                provider: ProviderTag::PaidBalanced,
                context_window: 200_000,
                price_in_per_1m: 3.0,
                price_out_per_1m: 15.0,
                complexity_band: (0.0, 1.0),
            },
        ];
        let b = budget();
        let router = ModelRouter::new(RouterConfig::default(), &models, &b);
        let choice = router
            .select(1_000, 0.5, Availability::default(), "default", 0)
            .unwrap();
        assert_eq!(
            choice.provider,
            ProviderTag::PaidBalanced,
            "narrow-cheap's band excludes complexity 0.5 and must be skipped"
        );
    }

    #[test]
    fn exhausted_cloud_free_budget_falls_through_to_cheap_paid() {
        let models = model_table();
        let mut cost_table = HashMap::new();
        cost_table.insert("cloud_free_8b".to_string(), 1_000_000.0);
        let b = BudgetTracker::new(vec![BudgetConfig::new("default", 10.0)], cost_table);
        b.track("default", "cloud_free_8b", 100, 0);
        let router = ModelRouter::new(RouterConfig::default(), &models, &b);
        let choice = router
            .select(1_000, 0.1, Availability { local: false, cloud_free: true }, "default", 0)
            .unwrap();
        assert_eq!(choice.provider, ProviderTag::PaidCheap);
    }
}
