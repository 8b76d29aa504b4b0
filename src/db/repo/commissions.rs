//! Commission request operations.
//!
//! Requests are exclusively owned by the commission workflow: created by the
//! payout writer, updated only by the reconciler, deleted only as the
//! compensating action for a failed sale transition.

use super::Repository;
use crate::domain::{CommissionRequest, Currency, PartnerId, RequestStatus, SaleTypeBreakdown, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

fn request_from_row(row: &SqliteRow) -> Result<CommissionRequest, sqlx::Error> {
    let status: String = row.get("status");
    let status =
        RequestStatus::from_str(&status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    let paid_at: Option<i64> = row.get("paid_at");

    Ok(CommissionRequest {
        id: row.get("id"),
        partner_id: PartnerId::new(row.get("partner_id")),
        partner_name: row.get("partner_name"),
        partner_coupon: row.get("partner_coupon"),
        total_commission_amount: row.get("total_commission_amount"),
        subscription: SaleTypeBreakdown {
            count: row.get("subscription_count"),
            commission_amount: row.get("subscription_amount"),
        },
        credit_pack: SaleTypeBreakdown {
            count: row.get("credit_pack_count"),
            commission_amount: row.get("credit_pack_amount"),
        },
        sales_count: row.get("sales_count"),
        currency: Currency::new(row.get("currency")),
        status,
        requested_at: TimeMs::new(row.get("requested_at")),
        paid_at: paid_at.map(TimeMs::new),
        notes: row.get("notes"),
    })
}

const REQUEST_COLUMNS: &str = "id, partner_id, partner_name, partner_coupon, \
    total_commission_amount, subscription_amount, subscription_count, \
    credit_pack_amount, credit_pack_count, sales_count, currency, status, \
    requested_at, paid_at, notes";

impl Repository {
    /// Insert a new commission request.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_commission_request(
        &self,
        request: &CommissionRequest,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO commission_requests (
                id, partner_id, partner_name, partner_coupon,
                total_commission_amount, subscription_amount, subscription_count,
                credit_pack_amount, credit_pack_count, sales_count, currency,
                status, requested_at, paid_at, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(request.partner_id.as_str())
        .bind(&request.partner_name)
        .bind(&request.partner_coupon)
        .bind(request.total_commission_amount)
        .bind(request.subscription.commission_amount)
        .bind(request.subscription.count)
        .bind(request.credit_pack.commission_amount)
        .bind(request.credit_pack.count)
        .bind(request.sales_count)
        .bind(request.currency.as_str())
        .bind(request.status.as_str())
        .bind(request.requested_at.as_ms())
        .bind(request.paid_at.map(|t| t.as_ms()))
        .bind(request.notes.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a commission request by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row is malformed.
    pub async fn get_commission_request(
        &self,
        id: &str,
    ) -> Result<Option<CommissionRequest>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM commission_requests WHERE id = ?",
            REQUEST_COLUMNS
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.map(|r| request_from_row(&r)).transpose()
    }

    /// Delete a commission request. The compensating action for a failed
    /// sale transition; never used on a paid request.
    ///
    /// Returns whether a row was actually deleted.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete_commission_request(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM commission_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a pending commission request as paid.
    ///
    /// Guarded by `status = 'pending'` so a concurrent duplicate admin
    /// action updates at most once. Returns whether the row transitioned.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn mark_request_paid(
        &self,
        id: &str,
        paid_at: TimeMs,
        notes: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE commission_requests
            SET status = 'paid', paid_at = ?, notes = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(paid_at.as_ms())
        .bind(notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List commission requests, newest first, optionally filtered by
    /// status and by a substring match on the partner name or coupon.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row is malformed.
    pub async fn list_commission_requests(
        &self,
        status: Option<RequestStatus>,
        search: Option<&str>,
    ) -> Result<Vec<CommissionRequest>, sqlx::Error> {
        let mut sql = format!("SELECT {} FROM commission_requests WHERE 1=1", REQUEST_COLUMNS);
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if search.is_some() {
            sql.push_str(" AND (partner_name LIKE ? OR partner_coupon LIKE ?)");
        }
        sql.push_str(" ORDER BY requested_at DESC, id DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        if let Some(search) = search {
            let pattern = format!("%{}%", search);
            query = query.bind(pattern.clone()).bind(pattern);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(request_from_row).collect()
    }
}
