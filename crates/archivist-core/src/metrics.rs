//! Bounded log of recent queries plus aggregate counters.
//!
//! Every append and its eviction happen under one mutex, so the ring
//! buffer never exceeds its capacity and readers never see a half-applied
//! append.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::models::IndexKey;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_LATENCY_WINDOW: usize = 100;

/// One logged query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRecord {
    pub query: String,
    pub latency_ms: f64,
    pub tokens: usize,
    pub namespace: String,
    pub collection: String,
}

impl QueryRecord {
    pub fn new(query: impl Into<String>, latency_ms: f64, tokens: usize, key: &IndexKey) -> Self {
        Self {
            query: query.into(),
            latency_ms,
            tokens,
            namespace: key.namespace.clone(),
            collection: key.collection.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: VecDeque<QueryRecord>,
    latencies: VecDeque<f64>,
    total_tokens: u64,
    total_queries: u64,
}

/// Fixed-capacity FIFO of [`QueryRecord`]s; the oldest entry is evicted first.
#[derive(Debug)]
pub struct MetricsLog {
    capacity: usize,
    latency_window: usize,
    inner: Mutex<Inner>,
}

impl MetricsLog {
    pub fn new(capacity: usize, latency_window: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CoreError::invalid_configuration(
                "metrics capacity must be >= 1",
            ));
        }
        if latency_window == 0 {
            return Err(CoreError::invalid_configuration(
                "metrics latency window must be >= 1",
            ));
        }
        Ok(Self {
            capacity,
            latency_window,
            inner: Mutex::new(Inner {
                records: VecDeque::with_capacity(capacity),
                latencies: VecDeque::with_capacity(latency_window),
                ..Default::default()
            }),
        })
    }

    /// Append a record, evicting the oldest one when full.
    pub fn log_query(&self, record: QueryRecord) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        inner.total_tokens += record.tokens as u64;
        inner.total_queries += 1;

        if inner.latencies.len() == self.latency_window {
            inner.latencies.pop_front();
        }
        inner.latencies.push_back(record.latency_ms);

        if inner.records.len() == self.capacity {
            if let Some(evicted) = inner.records.pop_front() {
                tracing::trace!(query = %evicted.query, "evicted oldest query record");
            }
        }
        inner.records.push_back(record);
    }

    /// Retained records, oldest first. Never longer than the capacity.
    pub fn recent_queries(&self) -> Vec<QueryRecord> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.records.iter().cloned().collect()
    }

    /// Tokens summed over every query ever logged, evicted ones included.
    pub fn total_tokens(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_tokens
    }

    pub fn total_queries(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_queries
    }

    /// Mean latency over the most recent `latency_window` queries, or 0.0.
    pub fn average_latency_ms(&self) -> f64 {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.latencies.is_empty() {
            return 0.0;
        }
        inner.latencies.iter().sum::<f64>() / inner.latencies.len() as f64
    }
}

impl Default for MetricsLog {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            latency_window: DEFAULT_LATENCY_WINDOW,
            inner: Mutex::new(Inner::default()),
        }
    }
}
