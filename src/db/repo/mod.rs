//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `sales.rs` - Sales ledger reads and settlement-status transitions
//! - `commissions.rs` - Commission request create/read/update/delete
//!
//! Rows are decoded into strongly-typed domain records at this boundary;
//! malformed rows (unknown enum text) surface as `sqlx::Error::Decode`.

mod commissions;
mod sales;

use crate::domain::{PartnerId, PartnerProfile, Role, TimeMs};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Partner profile operations
    // =========================================================================

    /// Insert a partner profile.
    ///
    /// Profiles are owned by the signup flow; this exists for tests and
    /// for seeding.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_partner_profile(
        &self,
        profile: &PartnerProfile,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO partner_profiles
            (id, display_name, coupon_code, commission_rate_bps, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(profile.id.as_str())
        .bind(&profile.display_name)
        .bind(&profile.coupon_code)
        .bind(profile.commission_rate_bps)
        .bind(profile.role.as_str())
        .bind(profile.created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a partner profile by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or the stored role is malformed.
    pub async fn get_partner_profile(
        &self,
        id: &PartnerId,
    ) -> Result<Option<PartnerProfile>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, coupon_code, commission_rate_bps, role, created_at
            FROM partner_profiles
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let role: String = r.get("role");
            let role = Role::from_str(&role).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

            Ok(PartnerProfile {
                id: PartnerId::new(r.get("id")),
                display_name: r.get("display_name"),
                coupon_code: r.get("coupon_code"),
                commission_rate_bps: r.get("commission_rate_bps"),
                role,
                created_at: TimeMs::new(r.get("created_at")),
            })
        })
        .transpose()
    }
}
