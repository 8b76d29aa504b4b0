//! Sales ledger operations.
//!
//! The ledger is shared with the checkout flow, which creates rows as
//! `unsettled`. This side only advances `settlement_status` forward and
//! restamps `settlement_date` on each transition.

use super::Repository;
use crate::domain::{Currency, PartnerId, Sale, SaleType, SettlementStatus, TimeMs};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;

fn sale_from_row(row: &SqliteRow) -> Result<Sale, sqlx::Error> {
    let sale_type: String = row.get("sale_type");
    let sale_type =
        SaleType::from_str(&sale_type).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    let settlement_status: String = row.get("settlement_status");
    let settlement_status = SettlementStatus::from_str(&settlement_status)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    let settlement_date: Option<i64> = row.get("settlement_date");

    Ok(Sale {
        id: row.get("id"),
        partner_id: PartnerId::new(row.get("partner_id")),
        sale_type,
        gross_amount: row.get("gross_amount"),
        currency: Currency::new(row.get("currency")),
        commission_rate_bps: row.get("commission_rate_bps"),
        commission_amount: row.get("commission_amount"),
        created_at: TimeMs::new(row.get("created_at")),
        settlement_status,
        settlement_date: settlement_date.map(TimeMs::new),
    })
}

impl Repository {
    /// Insert a sale.
    ///
    /// Sales are owned by the checkout flow; this exists for tests and
    /// for seeding.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_sale(&self, sale: &Sale) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, partner_id, sale_type, gross_amount, currency,
                commission_rate_bps, commission_amount, created_at,
                settlement_status, settlement_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.partner_id.as_str())
        .bind(sale.sale_type.as_str())
        .bind(sale.gross_amount)
        .bind(sale.currency.as_str())
        .bind(sale.commission_rate_bps)
        .bind(sale.commission_amount)
        .bind(sale.created_at.as_ms())
        .bind(sale.settlement_status.as_str())
        .bind(sale.settlement_date.map(|t| t.as_ms()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a sale by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row is malformed.
    pub async fn get_sale(&self, id: &str) -> Result<Option<Sale>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, partner_id, sale_type, gross_amount, currency,
                   commission_rate_bps, commission_amount, created_at,
                   settlement_status, settlement_date
            FROM sales
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| sale_from_row(&r)).transpose()
    }

    /// Query a partner's unsettled sales in deterministic order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row is malformed.
    pub async fn query_unsettled_sales(
        &self,
        partner_id: &PartnerId,
    ) -> Result<Vec<Sale>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, partner_id, sale_type, gross_amount, currency,
                   commission_rate_bps, commission_amount, created_at,
                   settlement_status, settlement_date
            FROM sales
            WHERE partner_id = ? AND settlement_status = 'unsettled'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(partner_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(sale_from_row).collect()
    }

    /// Conditionally transition the given sales from `unsettled` to
    /// `requested`, stamping `settlement_date = now`.
    ///
    /// The update is guarded by `settlement_status = 'unsettled'` so a
    /// concurrent payout request can win at most once per sale. Runs in a
    /// transaction: if fewer rows than expected match (another request got
    /// there first, or a sale vanished), the whole update is rolled back
    /// and `Ok(false)` is returned.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn transition_sales_to_requested(
        &self,
        partner_id: &PartnerId,
        sale_ids: &[String],
        now: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        if sale_ids.is_empty() {
            return Ok(true);
        }

        let placeholders = vec!["?"; sale_ids.len()].join(", ");
        let sql = format!(
            r#"
            UPDATE sales
            SET settlement_status = 'requested', settlement_date = ?
            WHERE partner_id = ? AND settlement_status = 'unsettled' AND id IN ({})
            "#,
            placeholders
        );

        let mut tx = self.pool.begin().await?;

        let mut query = sqlx::query(&sql).bind(now.as_ms()).bind(partner_id.as_str());
        for id in sale_ids {
            query = query.bind(id);
        }
        let result = query.execute(&mut *tx).await?;

        if result.rows_affected() as usize != sale_ids.len() {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Transition a partner's requested sales at or before `cutoff` to
    /// `paid`, restamping `settlement_date = now`.
    ///
    /// Returns the number of sales updated. Sales requested after `cutoff`
    /// (under a later payout request) are left untouched.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn mark_sales_paid(
        &self,
        partner_id: &PartnerId,
        cutoff: TimeMs,
        now: TimeMs,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET settlement_status = 'paid', settlement_date = ?
            WHERE partner_id = ?
              AND settlement_status = 'requested'
              AND settlement_date <= ?
            "#,
        )
        .bind(now.as_ms())
        .bind(partner_id.as_str())
        .bind(cutoff.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn sale(id: &str, partner: &str, created_at: i64) -> Sale {
        Sale {
            id: id.to_string(),
            partner_id: PartnerId::new(partner.to_string()),
            sale_type: SaleType::Subscription,
            gross_amount: 10_000,
            currency: Currency::new("BRL".to_string()),
            commission_rate_bps: 1_000,
            commission_amount: 1_000,
            created_at: TimeMs::new(created_at),
            settlement_status: SettlementStatus::Unsettled,
            settlement_date: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_sale() {
        let (repo, _temp) = setup_test_db().await;

        let s = sale("s-1", "p-1", 1000);
        repo.insert_sale(&s).await.unwrap();

        let loaded = repo.get_sale("s-1").await.unwrap().expect("sale exists");
        assert_eq!(loaded, s);
    }

    #[tokio::test]
    async fn test_query_unsettled_sales_ordered_and_filtered() {
        let (repo, _temp) = setup_test_db().await;

        repo.insert_sale(&sale("s-b", "p-1", 2000)).await.unwrap();
        repo.insert_sale(&sale("s-a", "p-1", 1000)).await.unwrap();
        repo.insert_sale(&sale("s-c", "p-2", 500)).await.unwrap();
        let mut requested = sale("s-d", "p-1", 100);
        requested.settlement_status = SettlementStatus::Requested;
        requested.settlement_date = Some(TimeMs::new(3000));
        repo.insert_sale(&requested).await.unwrap();

        let sales = repo
            .query_unsettled_sales(&PartnerId::new("p-1".to_string()))
            .await
            .unwrap();
        let ids: Vec<&str> = sales.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s-a", "s-b"]);
    }

    #[tokio::test]
    async fn test_transition_sales_to_requested() {
        let (repo, _temp) = setup_test_db().await;
        let partner = PartnerId::new("p-1".to_string());

        repo.insert_sale(&sale("s-1", "p-1", 1000)).await.unwrap();
        repo.insert_sale(&sale("s-2", "p-1", 2000)).await.unwrap();

        let ok = repo
            .transition_sales_to_requested(
                &partner,
                &["s-1".to_string(), "s-2".to_string()],
                TimeMs::new(9000),
            )
            .await
            .unwrap();
        assert!(ok);

        for id in ["s-1", "s-2"] {
            let s = repo.get_sale(id).await.unwrap().unwrap();
            assert_eq!(s.settlement_status, SettlementStatus::Requested);
            assert_eq!(s.settlement_date, Some(TimeMs::new(9000)));
        }
    }

    #[tokio::test]
    async fn test_transition_rolls_back_when_a_sale_was_already_taken() {
        let (repo, _temp) = setup_test_db().await;
        let partner = PartnerId::new("p-1".to_string());

        repo.insert_sale(&sale("s-1", "p-1", 1000)).await.unwrap();
        let mut taken = sale("s-2", "p-1", 2000);
        taken.settlement_status = SettlementStatus::Requested;
        taken.settlement_date = Some(TimeMs::new(5000));
        repo.insert_sale(&taken).await.unwrap();

        let ok = repo
            .transition_sales_to_requested(
                &partner,
                &["s-1".to_string(), "s-2".to_string()],
                TimeMs::new(9000),
            )
            .await
            .unwrap();
        assert!(!ok, "transition must report the lost race");

        // The whole update rolled back: s-1 must still be unsettled.
        let s1 = repo.get_sale("s-1").await.unwrap().unwrap();
        assert_eq!(s1.settlement_status, SettlementStatus::Unsettled);
        assert_eq!(s1.settlement_date, None);
        let s2 = repo.get_sale("s-2").await.unwrap().unwrap();
        assert_eq!(s2.settlement_date, Some(TimeMs::new(5000)));
    }

    #[tokio::test]
    async fn test_transition_ignores_other_partners_sales() {
        let (repo, _temp) = setup_test_db().await;

        repo.insert_sale(&sale("s-1", "p-2", 1000)).await.unwrap();

        let ok = repo
            .transition_sales_to_requested(
                &PartnerId::new("p-1".to_string()),
                &["s-1".to_string()],
                TimeMs::new(9000),
            )
            .await
            .unwrap();
        assert!(!ok);

        let s = repo.get_sale("s-1").await.unwrap().unwrap();
        assert_eq!(s.settlement_status, SettlementStatus::Unsettled);
    }

    #[tokio::test]
    async fn test_mark_sales_paid_respects_cutoff() {
        let (repo, _temp) = setup_test_db().await;
        let partner = PartnerId::new("p-1".to_string());

        let mut early = sale("s-1", "p-1", 1000);
        early.settlement_status = SettlementStatus::Requested;
        early.settlement_date = Some(TimeMs::new(5000));
        repo.insert_sale(&early).await.unwrap();

        let mut late = sale("s-2", "p-1", 2000);
        late.settlement_status = SettlementStatus::Requested;
        late.settlement_date = Some(TimeMs::new(7000));
        repo.insert_sale(&late).await.unwrap();

        let updated = repo
            .mark_sales_paid(&partner, TimeMs::new(5000), TimeMs::new(9000))
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let s1 = repo.get_sale("s-1").await.unwrap().unwrap();
        assert_eq!(s1.settlement_status, SettlementStatus::Paid);
        assert_eq!(s1.settlement_date, Some(TimeMs::new(9000)));

        let s2 = repo.get_sale("s-2").await.unwrap().unwrap();
        assert_eq!(
            s2.settlement_status,
            SettlementStatus::Requested,
            "sales requested after the cutoff must stay requested"
        );
    }

    #[tokio::test]
    async fn test_mark_sales_paid_skips_unsettled() {
        let (repo, _temp) = setup_test_db().await;
        let partner = PartnerId::new("p-1".to_string());

        repo.insert_sale(&sale("s-1", "p-1", 1000)).await.unwrap();

        let updated = repo
            .mark_sales_paid(&partner, TimeMs::new(9000), TimeMs::new(9500))
            .await
            .unwrap();
        assert_eq!(updated, 0);

        let s = repo.get_sale("s-1").await.unwrap().unwrap();
        assert_eq!(s.settlement_status, SettlementStatus::Unsettled);
    }

    #[tokio::test]
    async fn test_malformed_sale_type_rejected() {
        let (repo, _temp) = setup_test_db().await;

        sqlx::query(
            "INSERT INTO sales (id, partner_id, sale_type, gross_amount, currency, \
             commission_rate_bps, commission_amount, created_at, settlement_status) \
             VALUES ('s-bad', 'p-1', 'gift_card', 100, 'BRL', 0, 10, 0, 'unsettled')",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let err = repo.get_sale("s-bad").await.unwrap_err();
        assert!(matches!(err, sqlx::Error::Decode(_)));
    }
}
