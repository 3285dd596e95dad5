//! Trace summaries for diagnosing negotiation problems

use crate::trace::{TraceEntry, TraceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of a connection trace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Number of entries per wire tag
    pub counts: BTreeMap<String, usize>,
    /// Failure entries, in order
    pub failures: Vec<TraceEntry>,
    /// Asynchronous requests with no recorded outcome yet
    pub awaiting_outcome: Vec<TraceEntry>,
    /// Whether the connection was closed
    pub closed: bool,
    /// Offset of the last entry
    pub duration: Duration,
}

impl TraceSummary {
    /// Whether every asynchronous request has an outcome and none failed
    pub fn is_healthy(&self) -> bool {
        self.failures.is_empty() && self.awaiting_outcome.is_empty()
    }

    /// Count for one kind
    pub fn count(&self, kind: TraceKind) -> usize {
        self.counts.get(kind.as_str()).copied().unwrap_or(0)
    }
}

/// Analyzer over trace entries
#[derive(Debug, Default)]
pub struct TraceAnalyzer;

impl TraceAnalyzer {
    /// Create new trace analyzer
    pub fn new() -> Self {
        Self
    }

    /// Summarize `entries`.
    ///
    /// Outcomes are matched to the oldest unanswered request of the same
    /// operation, which is how hosts complete them.
    pub fn summarize(&self, entries: &[TraceEntry]) -> TraceSummary {
        let mut summary = TraceSummary::default();
        let mut open: Vec<&TraceEntry> = Vec::new();

        for entry in entries {
            *summary
                .counts
                .entry(entry.kind.as_str().to_string())
                .or_insert(0) += 1;

            if entry.kind.is_async_request() {
                open.push(entry);
            } else if let Some(request) = entry.kind.request() {
                if let Some(pos) = open.iter().position(|e| e.kind == request) {
                    open.remove(pos);
                }
            }

            if entry.kind.is_failure() {
                summary.failures.push(entry.clone());
            }
            if entry.kind == TraceKind::Stop {
                summary.closed = true;
            }
            summary.duration = entry.elapsed;
        }

        summary.awaiting_outcome = open.into_iter().cloned().collect();
        summary
    }
}
