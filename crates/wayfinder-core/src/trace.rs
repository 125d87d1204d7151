//! Tool-call trace recorder.
//!
//! One recorder accumulates the ordered, redacted log of external
//! capability invocations made while producing a single generation result.
//! The trace is write-once: it is attached to the run's audit record and
//! never read back into behavior.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sanitize::redact_json;

/// Maximum number of entries kept per generation run.
pub const TRACE_CAP: usize = 60;

/// How many items an output summary keeps verbatim.
const SUMMARY_ITEMS: usize = 3;

/// One recorded capability invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub latency_ms: u64,
}

/// Ordered, capped trace of tool calls for one generation run.
#[derive(Debug)]
pub struct TraceRecorder {
    entries: Vec<ToolCallRecord>,
    cap: usize,
    dropped: usize,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::with_cap(TRACE_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap,
            dropped: 0,
        }
    }

    /// Append an entry, redacting input and output. Entries past the cap
    /// are counted but not kept.
    pub fn record(
        &mut self,
        tool: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        latency: Duration,
    ) {
        if self.entries.len() >= self.cap {
            self.dropped += 1;
            return;
        }
        self.entries.push(ToolCallRecord {
            tool: tool.to_owned(),
            input: redact_json(&input),
            output: redact_json(&output),
            latency_ms: latency.as_millis() as u64,
        });
    }

    pub fn entries(&self) -> &[ToolCallRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries dropped because the cap was reached.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Serialize the trace for the audit sink.
    pub fn into_json(self) -> serde_json::Value {
        serde_json::json!({
            "entries": self.entries,
            "dropped": self.dropped,
        })
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncated output summary for a provider call: count plus the first few
/// items.
pub fn output_summary<T: Serialize>(items: &[T]) -> serde_json::Value {
    let first: Vec<serde_json::Value> = items
        .iter()
        .take(SUMMARY_ITEMS)
        .map(|item| serde_json::to_value(item).unwrap_or(serde_json::Value::Null))
        .collect();
    serde_json::json!({
        "count": items.len(),
        "first": first,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_redacts_payloads() {
        let mut trace = TraceRecorder::new();
        trace.record(
            "flights.search",
            json!({"contact": "alice@example.com"}),
            json!({"note": "+1 415 555 0192 x"}),
            Duration::from_millis(12),
        );
        let entry = &trace.entries()[0];
        assert_eq!(entry.input["contact"], "[email]");
        assert_eq!(entry.output["note"], "[phone] x");
        assert_eq!(entry.latency_ms, 12);
    }

    #[test]
    fn cap_bounds_entry_count() {
        let mut trace = TraceRecorder::with_cap(2);
        for i in 0..5 {
            trace.record("routing.estimate", json!({"i": i}), json!({}), Duration::ZERO);
        }
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.dropped(), 3);
    }

    #[test]
    fn summary_keeps_count_and_first_three() {
        let items = vec![1, 2, 3, 4, 5];
        let summary = output_summary(&items);
        assert_eq!(summary["count"], 5);
        assert_eq!(summary["first"], json!([1, 2, 3]));
    }

    #[test]
    fn into_json_carries_entries_and_dropped() {
        let mut trace = TraceRecorder::with_cap(1);
        trace.record("poi.search", json!({}), json!({}), Duration::ZERO);
        trace.record("poi.search", json!({}), json!({}), Duration::ZERO);
        let value = trace.into_json();
        assert_eq!(value["entries"].as_array().unwrap().len(), 1);
        assert_eq!(value["dropped"], 1);
    }
}
