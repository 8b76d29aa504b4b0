//! Payout eligibility policy.
//!
//! A sale only counts toward a commission request once it is 15 days old,
//! so chargeback/refund windows have closed before a payout is committed.

use crate::domain::{Sale, SettlementStatus, TimeMs};

/// Minimum sale age before it can be included in a commission request.
pub const ELIGIBILITY_WINDOW_MS: i64 = 15 * 24 * 60 * 60 * 1000;

/// Whether `sale` can be included in a payout request at time `now`.
///
/// Pure and deterministic given `now`: the sale must still be unsettled and
/// at least 15 days old, clocked from `created_at`. Exactly 15 days counts.
pub fn is_eligible(sale: &Sale, now: TimeMs) -> bool {
    sale.settlement_status == SettlementStatus::Unsettled
        && now.since(sale.created_at) >= ELIGIBILITY_WINDOW_MS
}
