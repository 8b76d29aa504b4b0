//! Commission request: a partner's batch payout claim over eligible sales.

use crate::domain::sale::ParseEnumError;
use crate::domain::{Currency, PartnerId, TimeMs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Payout lifecycle of a commission request. Transitions pending -> paid
/// exactly once; re-reconciling a paid request is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Paid,
}

impl RequestStatus {
    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Paid => "paid",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "paid" => Ok(RequestStatus::Paid),
            other => Err(ParseEnumError {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-sale-type slice of an aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTypeBreakdown {
    /// Number of sales of this type.
    pub count: i64,
    /// Sum of their commission amounts, in minor units.
    pub commission_amount: i64,
}

/// An immutable batch payout claim.
///
/// Totals, counts, and the partner name/coupon snapshots are fixed at
/// creation; the reconciler only ever sets `status`, `paid_at`, and `notes`.
/// `requested_at` doubles as the cutoff used to find the covered sales
/// during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRequest {
    pub id: String,
    pub partner_id: PartnerId,
    /// Partner display name at request time, for audit.
    pub partner_name: String,
    /// Partner coupon code at request time, for audit.
    pub partner_coupon: String,
    /// Overall commission owed, in minor units.
    pub total_commission_amount: i64,
    pub subscription: SaleTypeBreakdown,
    pub credit_pack: SaleTypeBreakdown,
    /// Number of sales folded into this request.
    pub sales_count: i64,
    pub currency: Currency,
    pub status: RequestStatus,
    pub requested_at: TimeMs,
    pub paid_at: Option<TimeMs>,
    /// Free text set by the admin on reconciliation.
    pub notes: Option<String>,
}
