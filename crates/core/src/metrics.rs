//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Issuance (tickets issued per class)
//! - Dispatch (tickets called, empty calls)
//! - Lifecycle (tickets served, tickets discarded)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

/// Tickets issued total by class.
pub static TICKETS_ISSUED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("guichet_tickets_issued_total", "Total tickets issued"),
        &["class"], // "SP", "SE", "SG"
    )
    .unwrap()
});

/// Tickets called total by class.
pub static TICKETS_CALLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("guichet_tickets_called_total", "Total tickets called"),
        &["class"],
    )
    .unwrap()
});

/// Tickets served total.
pub static TICKETS_SERVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "guichet_tickets_served_total",
        "Total tickets marked served",
    )
    .unwrap()
});

/// Tickets discarded total.
pub static TICKETS_DISCARDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "guichet_tickets_discarded_total",
        "Total tickets discarded before being called",
    )
    .unwrap()
});

/// Calls made while every queue was empty.
pub static EMPTY_CALLS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "guichet_empty_calls_total",
        "Total call attempts with all queues empty",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKETS_ISSUED.clone()),
        Box::new(TICKETS_CALLED.clone()),
        Box::new(TICKETS_SERVED.clone()),
        Box::new(TICKETS_DISCARDED.clone()),
        Box::new(EMPTY_CALLS.clone()),
    ]
}
