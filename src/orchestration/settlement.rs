//! Commission settlement workflow: aggregation, payout requests,
//! and admin reconciliation.

use crate::db::Repository;
use crate::domain::{
    CommissionRequest, PartnerId, RequestStatus, Role, TimeMs,
};
use crate::engine::{aggregate_eligible, Aggregation};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Errors surfaced by the commission workflow.
#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("profile {0} is not a partner")]
    NotAPartner(PartnerId),
    #[error("no eligible sales: sales must be at least 15 days old")]
    NoEligibleSales,
    #[error("commission request {0} not found")]
    RequestNotFound(String),
    #[error("sale transition affected fewer rows than aggregated (expected {expected})")]
    SaleTransitionConflict { expected: usize },
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// Orchestrates the commission payout lifecycle over the sales ledger and
/// the commission request store.
#[derive(Clone)]
pub struct CommissionService {
    repo: Arc<Repository>,
}

impl CommissionService {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Aggregate a partner's eligible sales at `now`.
    ///
    /// Read-only: loads the profile (rejecting non-partner roles), fetches
    /// the unsettled sales, and folds the eligible subset into totals.
    pub async fn aggregate(
        &self,
        partner_id: &PartnerId,
        now: TimeMs,
    ) -> Result<Aggregation, CommissionError> {
        let profile = self
            .repo
            .get_partner_profile(partner_id)
            .await?
            .filter(|p| p.role == Role::Partner)
            .ok_or_else(|| CommissionError::NotAPartner(partner_id.clone()))?;

        let sales = self.repo.query_unsettled_sales(partner_id).await?;

        aggregate_eligible(&profile, &sales, now).ok_or(CommissionError::NoEligibleSales)
    }

    /// Persist a commission request for a completed aggregation and flip
    /// the aggregated sales to `requested`.
    ///
    /// The two writes are not one transaction: if the sale transition fails
    /// or loses a race for any sale, the just-created request row is deleted
    /// again so no request can exist without matching sale transitions. A
    /// failed compensating delete leaves a manual-repair obligation and is
    /// logged at error severity.
    pub async fn create_request(
        &self,
        aggregation: &Aggregation,
        now: TimeMs,
    ) -> Result<CommissionRequest, CommissionError> {
        let request = CommissionRequest {
            id: Uuid::new_v4().to_string(),
            partner_id: aggregation.partner_id.clone(),
            partner_name: aggregation.partner_name.clone(),
            partner_coupon: aggregation.partner_coupon.clone(),
            total_commission_amount: aggregation.total_commission_amount,
            subscription: aggregation.subscription,
            credit_pack: aggregation.credit_pack,
            sales_count: aggregation.sales_count,
            currency: aggregation.currency.clone(),
            status: RequestStatus::Pending,
            requested_at: now,
            paid_at: None,
            notes: None,
        };

        self.repo.insert_commission_request(&request).await?;

        let transition = self
            .repo
            .transition_sales_to_requested(&aggregation.partner_id, &aggregation.sale_ids, now)
            .await;

        match transition {
            Ok(true) => {
                info!(
                    partner_id = %aggregation.partner_id,
                    request_id = %request.id,
                    sales_count = aggregation.sales_count,
                    total = aggregation.total_commission_amount,
                    "Commission request created"
                );
                Ok(request)
            }
            Ok(false) => {
                self.compensate(&request).await;
                Err(CommissionError::SaleTransitionConflict {
                    expected: aggregation.sale_ids.len(),
                })
            }
            Err(e) => {
                self.compensate(&request).await;
                Err(CommissionError::Store(e))
            }
        }
    }

    async fn compensate(&self, request: &CommissionRequest) {
        match self.repo.delete_commission_request(&request.id).await {
            Ok(_) => {
                warn!(
                    partner_id = %request.partner_id,
                    request_id = %request.id,
                    "Sale transition failed; commission request deleted"
                );
            }
            Err(e) => {
                error!(
                    partner_id = %request.partner_id,
                    request_id = %request.id,
                    error = %e,
                    "Compensating delete failed; orphaned commission request requires manual repair"
                );
            }
        }
    }

    /// Aggregate and persist a payout request for `partner_id` at `now`.
    ///
    /// Returns the created request together with the aggregation so the
    /// caller can display the per-type breakdown.
    pub async fn request_payout(
        &self,
        partner_id: &PartnerId,
        now: TimeMs,
    ) -> Result<(CommissionRequest, Aggregation), CommissionError> {
        let aggregation = self.aggregate(partner_id, now).await?;
        let request = self.create_request(&aggregation, now).await?;
        Ok((request, aggregation))
    }

    /// Mark a commission request as paid and propagate `paid` onto the
    /// sales it covers.
    ///
    /// Idempotent: an already-paid request is returned unchanged. The sale
    /// propagation is best-effort by design; its failure is logged, never
    /// surfaced, because the paid request row is the authoritative financial
    /// record and the sale statuses can be repaired afterwards.
    pub async fn mark_paid(
        &self,
        request_id: &str,
        notes: Option<String>,
        now: TimeMs,
    ) -> Result<CommissionRequest, CommissionError> {
        let request = self
            .repo
            .get_commission_request(request_id)
            .await?
            .ok_or_else(|| CommissionError::RequestNotFound(request_id.to_string()))?;

        if request.status == RequestStatus::Paid {
            info!(request_id = %request.id, "Commission request already paid; no-op");
            return Ok(request);
        }

        let transitioned = self
            .repo
            .mark_request_paid(request_id, now, notes.as_deref())
            .await?;

        if transitioned {
            match self
                .repo
                .mark_sales_paid(&request.partner_id, request.requested_at, now)
                .await
            {
                Ok(updated) => {
                    if updated as i64 != request.sales_count {
                        warn!(
                            partner_id = %request.partner_id,
                            request_id = %request.id,
                            expected = request.sales_count,
                            updated,
                            "Paid-sale propagation count differs from request; follow-up reconciliation needed"
                        );
                    }
                }
                Err(e) => {
                    error!(
                        partner_id = %request.partner_id,
                        request_id = %request.id,
                        error = %e,
                        "Paid-sale propagation failed after request was marked paid; manual repair required"
                    );
                }
            }
        }

        let paid = self
            .repo
            .get_commission_request(request_id)
            .await?
            .ok_or_else(|| CommissionError::RequestNotFound(request_id.to_string()))?;
        Ok(paid)
    }

    /// List commission requests for admin review.
    pub async fn list_requests(
        &self,
        status: Option<RequestStatus>,
        search: Option<&str>,
    ) -> Result<Vec<CommissionRequest>, CommissionError> {
        Ok(self.repo.list_commission_requests(status, search).await?)
    }
}
