//! Initial snapshot delivered after a client subscribes.

pub mod aggregator;

pub use aggregator::ReadyAggregator;
