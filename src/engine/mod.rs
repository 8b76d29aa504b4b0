//! Pure computation engine for the commission workflow.

pub mod aggregator;

pub use aggregator::{aggregate_eligible, Aggregation};
