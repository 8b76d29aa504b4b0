use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::api::{authenticate, require_role, AppState};
use crate::domain::{Role, SaleTypeBreakdown, TimeMs};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutResponse {
    pub request_id: String,
    pub requested_at: i64,
    pub total_commission_amount: i64,
    pub sales_count: i64,
    pub currency: String,
    pub subscription: BreakdownDto,
    pub credit_pack: BreakdownDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownDto {
    pub count: i64,
    pub commission_amount: i64,
}

impl From<SaleTypeBreakdown> for BreakdownDto {
    fn from(b: SaleTypeBreakdown) -> Self {
        BreakdownDto {
            count: b.count,
            commission_amount: b.commission_amount,
        }
    }
}

/// Partner action: aggregate eligible sales and create a payout request.
pub async fn request_payout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PayoutResponse>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    require_role(&caller, Role::Partner)?;

    let (request, aggregation) = state
        .commissions
        .request_payout(&caller.profile_id, TimeMs::now())
        .await?;

    Ok(Json(PayoutResponse {
        request_id: request.id,
        requested_at: request.requested_at.as_ms(),
        total_commission_amount: request.total_commission_amount,
        sales_count: request.sales_count,
        currency: request.currency.as_str().to_string(),
        subscription: aggregation.subscription.into(),
        credit_pack: aggregation.credit_pack.into(),
    }))
}
