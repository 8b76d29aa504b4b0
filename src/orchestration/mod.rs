//! Multi-step workflows coordinating the stores.

pub mod settlement;

pub use settlement::{CommissionError, CommissionService};
