//! Domain primitives: TimeMs, PartnerId, Currency.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier` (saturating, never negative).
    pub fn since(&self, earlier: TimeMs) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Partner/profile identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub String);

impl PartnerId {
    /// Create a PartnerId from a string.
    pub fn new(id: String) -> Self {
        PartnerId(id)
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO currency code (e.g., "BRL", "USD").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    /// Create a Currency from a string.
    pub fn new(code: String) -> Self {
        Currency(code)
    }

    /// Get the currency code as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timems_ordering() {
        let t1 = TimeMs::new(1000);
        let t2 = TimeMs::new(2000);
        assert!(t1 < t2);
    }

    #[test]
    fn test_timems_since() {
        let t1 = TimeMs::new(1000);
        let t2 = TimeMs::new(2500);
        assert_eq!(t2.since(t1), 1500);
        assert_eq!(t1.since(t2), 0, "since saturates at zero");
    }

    #[test]
    fn test_partner_id_display() {
        let id = PartnerId::new("p-123".to_string());
        assert_eq!(id.to_string(), "p-123");
    }

    #[test]
    fn test_currency_display() {
        let currency = Currency::new("BRL".to_string());
        assert_eq!(currency.to_string(), "BRL");
    }
}
