//! Sale record: a single coupon-attributed purchase generating a commission.

use crate::domain::{Currency, PartnerId, TimeMs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a stored enum value cannot be parsed.
#[derive(Debug, Clone, Error)]
#[error("invalid {field}: {value}")]
pub struct ParseEnumError {
    pub field: &'static str,
    pub value: String,
}

/// What kind of purchase produced this sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Subscription,
    CreditPack,
}

impl SaleType {
    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Subscription => "subscription",
            SaleType::CreditPack => "credit_pack",
        }
    }
}

impl FromStr for SaleType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(SaleType::Subscription),
            "credit_pack" => Ok(SaleType::CreditPack),
            other => Err(ParseEnumError {
                field: "sale_type",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SaleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle stage of a sale's commission. Only ever moves forward:
/// unsettled -> requested -> paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Unsettled,
    Requested,
    Paid,
}

impl SettlementStatus {
    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Unsettled => "unsettled",
            SettlementStatus::Requested => "requested",
            SettlementStatus::Paid => "paid",
        }
    }
}

impl FromStr for SettlementStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsettled" => Ok(SettlementStatus::Unsettled),
            "requested" => Ok(SettlementStatus::Requested),
            "paid" => Ok(SettlementStatus::Paid),
            other => Err(ParseEnumError {
                field: "settlement_status",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A completed, partner-attributed purchase.
///
/// Rows are created by the checkout flow; the commission workflow only ever
/// advances `settlement_status` and restamps `settlement_date`. Amounts are
/// minor currency units; `commission_amount` is computed at sale time and is
/// never recomputed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Unique sale identifier.
    pub id: String,
    /// Owning partner/profile reference.
    pub partner_id: PartnerId,
    /// Subscription vs. credit pack.
    pub sale_type: SaleType,
    /// Gross purchase amount in minor units.
    pub gross_amount: i64,
    /// ISO currency code.
    pub currency: Currency,
    /// Commission rate snapshot at sale time, in basis points.
    pub commission_rate_bps: i64,
    /// Commission owed for this sale, in minor units.
    pub commission_amount: i64,
    /// Sale timestamp; start of the eligibility clock.
    pub created_at: TimeMs,
    /// Current settlement lifecycle stage.
    pub settlement_status: SettlementStatus,
    /// Stamped on every forward status transition.
    pub settlement_date: Option<TimeMs>,
}
