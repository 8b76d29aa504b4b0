//! Domain types for the partner commission workflow.
//!
//! This module provides:
//! - Domain primitives: TimeMs, PartnerId, Currency
//! - Sale and CommissionRequest records with their lifecycle enums
//! - Partner profile and role types
//! - The payout eligibility policy

pub mod commission;
pub mod partner;
pub mod policy;
pub mod primitives;
pub mod sale;

pub use commission::{CommissionRequest, RequestStatus, SaleTypeBreakdown};
pub use partner::{PartnerProfile, Role};
pub use policy::{is_eligible, ELIGIBILITY_WINDOW_MS};
pub use primitives::{Currency, PartnerId, TimeMs};
pub use sale::{ParseEnumError, Sale, SaleType, SettlementStatus};
