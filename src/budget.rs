//! C10 — Budget Tracker.
//!
//! Per-provider daily token budget with a midnight-UTC reset boundary and
//! a `>0.9·daily_limit` alert side effect (spec §4.8). Grounded directly
//! on `src.legacy/adapters/providers/routing/cost_tracker.rs`'s
//! `CostTracker` (`DashMap`-keyed usage metrics, `chrono::DateTime<Utc>`
//! timestamps) but redesigned around the spec's fixed
//! daily-limit-plus-midnight-reset semantics rather than the teacher's
//! open-ended per-provider budget ceiling with no reset boundary at all.
//! `now_ms` is threaded through every call explicitly (rather than read
//! from the system clock) for the same testability reason `Query::now` is
//! injected in §3.

use crate::config::BudgetConfig;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use std::collections::HashMap;

/// Point-in-time snapshot returned by [`BudgetTracker::stats`] (spec §4.8).
#[derive(Debug, Clone, Copy)]
pub struct BudgetStats {
    pub used: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub resets_at: i64,
}

/// An alert is an observable event, not an error (spec §4.8): the caller
/// (front end, metrics exporter) decides what to do with it.
#[derive(Debug, Clone)]
pub struct BudgetAlert {
    pub provider: String,
    pub used: f64,
    pub daily_limit: f64,
}

#[derive(Debug, Clone)]
struct ProviderState {
    used: f64,
    resets_at: i64,
}

/// Per-provider usage tracker. One instance covers every provider the
/// Model Router knows about; `configs` and `cost_table` are fixed at
/// construction (spec §9: "configuration is immutable per run").
pub struct BudgetTracker {
    configs: HashMap<String, BudgetConfig>,
    /// model name → cost in currency units per 1,000,000 tokens.
    cost_table: HashMap<String, f64>,
    state: DashMap<String, ProviderState>,
    alerts: tokio::sync::broadcast::Sender<BudgetAlert>,
}

impl BudgetTracker {
    pub fn new(configs: Vec<BudgetConfig>, cost_table: HashMap<String, f64>) -> Self {
        let (alerts, _rx) = tokio::sync::broadcast::channel(64);
        Self {
            configs: configs.into_iter().map(|c| (c.provider.clone(), c)).collect(),
            cost_table,
            state: DashMap::new(),
            alerts,
        }
    }

    /// Subscribe to the alert side-effect stream (spec §4.8).
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<BudgetAlert> {
        self.alerts.subscribe()
    }

    fn cost_of(&self, model: &str, tokens: u64) -> f64 {
        let price_per_million = self.cost_table.get(model).copied().unwrap_or(0.0);
        price_per_million * tokens as f64 / 1_000_000.0
    }

    /// Read (and reset-if-due) a provider's state, creating it on first
    /// access. Returns the provider's `daily_limit` and `alert_threshold`
    /// alongside the entry so callers don't need a second config lookup.
    fn entry(&self, provider: &str, now_ms: i64) -> (f64, f64, f64, i64) {
        let (daily_limit, alert_threshold) = self
            .configs
            .get(provider)
            .map(|c| (c.daily_limit, c.alert_threshold))
            .unwrap_or((0.0, 0.9));

        let mut state = self
            .state
            .entry(provider.to_string())
            .or_insert_with(|| ProviderState {
                used: 0.0,
                resets_at: next_midnight_utc(now_ms),
            });

        if now_ms >= state.resets_at {
            state.used = 0.0;
            state.resets_at = next_midnight_utc(now_ms);
        }

        (state.used, daily_limit, alert_threshold, state.resets_at)
    }

    /// `can_afford(model, tokens) → bool` (spec §4.8).
    pub fn can_afford(&self, provider: &str, model: &str, tokens: u64, now_ms: i64) -> bool {
        let (used, daily_limit, _, _) = self.entry(provider, now_ms);
        used + self.cost_of(model, tokens) <= daily_limit
    }

    /// `track(model, tokens)` (spec §4.8). Fires the alert side effect
    /// when `used > alert_threshold * daily_limit` after recording.
    pub fn track(&self, provider: &str, model: &str, tokens: u64, now_ms: i64) {
        let (_, daily_limit, alert_threshold, _) = self.entry(provider, now_ms);
        let cost = self.cost_of(model, tokens);

        let mut state = self.state.get_mut(provider).expect("entry() just inserted this key");
        state.used += cost;
        let used = state.used;
        drop(state);

        if daily_limit > 0.0 && used > alert_threshold * daily_limit {
            let _ = self.alerts.send(BudgetAlert {
                provider: provider.to_string(),
                used,
                daily_limit,
            });
        }
    }

    /// `remaining() → number` (spec §4.8).
    pub fn remaining(&self, provider: &str, now_ms: i64) -> f64 {
        let (used, daily_limit, _, _) = self.entry(provider, now_ms);
        (daily_limit - used).max(0.0)
    }

    /// `stats() → {used, remaining, percentage, resets_at}` (spec §4.8).
    pub fn stats(&self, provider: &str, now_ms: i64) -> BudgetStats {
        let (used, daily_limit, _, resets_at) = self.entry(provider, now_ms);
        let remaining = (daily_limit - used).max(0.0);
        let percentage = if daily_limit > 0.0 { used / daily_limit } else { 0.0 };
        BudgetStats {
            used,
            remaining,
            percentage,
            resets_at,
        }
    }
}

/// Next strict midnight-UTC boundary after `now_ms` (Unix milliseconds).
fn next_midnight_utc(now_ms: i64) -> i64 {
    let now: DateTime<Utc> = Utc.timestamp_millis_opt(now_ms).single().unwrap_or_else(Utc::now);
    let next_day = now.date_naive().succ_opt().expect("date arithmetic does not overflow here");
    next_day
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
        .timestamp_millis()
}
