//! Partner profile: an affiliate account with a coupon code and rate.

use crate::domain::{PartnerId, TimeMs};
use crate::domain::sale::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Account role as stored on the profile and returned by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Partner,
    Admin,
}

impl Role {
    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Partner => "partner",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "partner" => Ok(Role::Partner),
            "admin" => Ok(Role::Admin),
            other => Err(ParseEnumError {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Affiliate profile row. Written by the signup flow; read here for the
/// role gate and the name/coupon snapshots on commission requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub id: PartnerId,
    pub display_name: String,
    pub coupon_code: String,
    /// Current commission rate in basis points. Informational only; each
    /// sale carries its own immutable rate snapshot.
    pub commission_rate_bps: i64,
    pub role: Role,
    pub created_at: TimeMs,
}
