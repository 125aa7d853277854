//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Connections opened
    pub connections_opened: AtomicU64,
    /// Connections closed
    pub connections_closed: AtomicU64,
    /// Online/offline transitions
    pub presence_edges: AtomicU64,
    /// Subscriptions accepted
    pub subscriptions_accepted: AtomicU64,
    /// Subscriptions refused
    pub subscriptions_rejected: AtomicU64,
    /// Publications handed to the substrate
    pub events_published: AtomicU64,
    /// Publications the substrate refused
    pub publish_failures: AtomicU64,
    /// READY events delivered
    pub ready_delivered: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            presence_edges: self.presence_edges.load(Ordering::Relaxed),
            subscriptions_accepted: self.subscriptions_accepted.load(Ordering::Relaxed),
            subscriptions_rejected: self.subscriptions_rejected.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            ready_delivered: self.ready_delivered.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections opened
    pub connections_opened: u64,
    /// Connections closed
    pub connections_closed: u64,
    /// Online/offline transitions
    pub presence_edges: u64,
    /// Subscriptions accepted
    pub subscriptions_accepted: u64,
    /// Subscriptions refused
    pub subscriptions_rejected: u64,
    /// Publications handed to the substrate
    pub events_published: u64,
    /// Publications the substrate refused
    pub publish_failures: u64,
    /// READY events delivered
    pub ready_delivered: u64,
}

impl MetricsSnapshot {
    /// Connections currently open
    pub fn connections_active(&self) -> u64 {
        self.connections_opened.saturating_sub(self.connections_closed)
    }
}
