//! Metrics collection module
//!
//! Tracks turn outcomes and collaborator stage latencies.

use crate::orchestrator::{TurnOutcome, TurnReport};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Number of latency samples kept per stage
const LATENCY_WINDOW: usize = 100;

/// In-process metrics collector
pub struct Metrics {
    /// Total turn count
    pub total_turns: AtomicU64,
    /// Turns by outcome
    outcomes: RwLock<HashMap<TurnOutcome, u64>>,
    /// Stage response times (rolling window in ms)
    stage_times: RwLock<HashMap<&'static str, Vec<u64>>>,
    /// Replies that could not be delivered to the chat transport
    delivery_failures: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_turns: AtomicU64::new(0),
            outcomes: RwLock::new(HashMap::new()),
            stage_times: RwLock::new(HashMap::new()),
            delivery_failures: AtomicU64::new(0),
        }
    }

    /// Record a finished turn
    pub fn record_turn(&self, report: &TurnReport) {
        self.total_turns.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut outcomes) = self.outcomes.write() {
            *outcomes.entry(report.outcome).or_insert(0) += 1;
        }

        if let Some(ms) = report.search_ms {
            self.record_stage_time("search", ms);
        }
        if let Some(ms) = report.generate_ms {
            self.record_stage_time("generate", ms);
        }
        self.record_stage_time("turn", report.total_ms);
    }

    /// Record a stage response time
    pub fn record_stage_time(&self, stage: &'static str, time_ms: u64) {
        let Ok(mut times) = self.stage_times.write() else {
            return;
        };
        let entry = times.entry(stage).or_default();

        if entry.len() >= LATENCY_WINDOW {
            entry.remove(0);
        }
        entry.push(time_ms);
    }

    /// Record a reply the transport rejected
    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total turns
    pub fn get_total_turns(&self) -> u64 {
        self.total_turns.load(Ordering::Relaxed)
    }

    /// Get the number of turns that ended with `outcome`
    pub fn get_outcome_count(&self, outcome: TurnOutcome) -> u64 {
        self.outcomes
            .read()
            .ok()
            .and_then(|o| o.get(&outcome).copied())
            .unwrap_or(0)
    }

    /// Get average response time for a stage
    pub fn get_avg_stage_time(&self, stage: &str) -> Option<u64> {
        let times = self.stage_times.read().ok()?;
        times.get(stage).and_then(|t| {
            if t.is_empty() {
                None
            } else {
                Some(t.iter().sum::<u64>() / t.len() as u64)
            }
        })
    }

    /// Snapshot for the stats endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        let outcomes = self
            .outcomes
            .read()
            .map(|o| o.iter().map(|(k, v)| (k.as_str(), *v)).collect())
            .unwrap_or_default();

        let avg_stage_ms = ["search", "generate", "turn"]
            .into_iter()
            .filter_map(|stage| self.get_avg_stage_time(stage).map(|ms| (stage, ms)))
            .collect();

        MetricsSnapshot {
            total_turns: self.get_total_turns(),
            outcomes,
            avg_stage_ms,
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_turns: u64,
    pub outcomes: HashMap<&'static str, u64>,
    pub avg_stage_ms: HashMap<&'static str, u64>,
    pub delivery_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: TurnOutcome, search_ms: Option<u64>) -> TurnReport {
        TurnReport {
            reply: "r".to_string(),
            outcome,
            document_count: 0,
            search_ms,
            generate_ms: Some(40),
            total_ms: 100,
        }
    }

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.record_turn(&report(TurnOutcome::Answered, Some(10)));
        metrics.record_turn(&report(TurnOutcome::Answered, Some(30)));
        metrics.record_turn(&report(TurnOutcome::TimedOut, None));

        assert_eq!(metrics.get_total_turns(), 3);
        assert_eq!(metrics.get_outcome_count(TurnOutcome::Answered), 2);
        assert_eq!(metrics.get_outcome_count(TurnOutcome::GenerationFailed), 0);
        assert_eq!(metrics.get_avg_stage_time("search"), Some(20));
        assert_eq!(metrics.get_avg_stage_time("turn"), Some(100));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.outcomes.get("timed_out"), Some(&1));
    }

    #[test]
    fn test_latency_window_is_bounded() {
        let metrics = Metrics::new();
        for i in 0..(LATENCY_WINDOW as u64 + 10) {
            metrics.record_stage_time("search", i);
        }
        // Oldest 10 samples were evicted
        let expected = (10..LATENCY_WINDOW as u64 + 10).sum::<u64>() / LATENCY_WINDOW as u64;
        assert_eq!(metrics.get_avg_stage_time("search"), Some(expected));
    }
}
