use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::{authenticate, require_role, AppState};
use crate::domain::{CommissionRequest, RequestStatus, Role, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionListResponse {
    pub requests: Vec<CommissionRequestDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRequestDto {
    pub id: String,
    pub partner_id: String,
    pub partner_name: String,
    pub partner_coupon: String,
    pub total_commission_amount: i64,
    pub sales_count: i64,
    pub currency: String,
    pub status: String,
    pub requested_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<CommissionRequest> for CommissionRequestDto {
    fn from(r: CommissionRequest) -> Self {
        CommissionRequestDto {
            id: r.id,
            partner_id: r.partner_id.as_str().to_string(),
            partner_name: r.partner_name,
            partner_coupon: r.partner_coupon,
            total_commission_amount: r.total_commission_amount,
            sales_count: r.sales_count,
            currency: r.currency.as_str().to_string(),
            status: r.status.as_str().to_string(),
            requested_at: r.requested_at.as_ms(),
            paid_at: r.paid_at.map(|t| t.as_ms()),
            notes: r.notes,
        }
    }
}

/// Admin action: list commission requests with optional status filter and
/// partner name/coupon search.
pub async fn list_commissions(
    Query(params): Query<ListQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CommissionListResponse>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    require_role(&caller, Role::Admin)?;

    let status = params
        .status
        .as_deref()
        .map(RequestStatus::from_str)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let requests = state
        .commissions
        .list_requests(status, params.search.as_deref())
        .await?;

    Ok(Json(CommissionListResponse {
        requests: requests.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PayBody {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    pub request: CommissionRequestDto,
}

/// Admin action: mark a commission request as paid. Idempotent on repeat.
pub async fn pay_commission(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<PayBody>>,
) -> Result<Json<PayResponse>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    require_role(&caller, Role::Admin)?;

    let notes = body.and_then(|Json(b)| b.notes);
    let request = state
        .commissions
        .mark_paid(&id, notes, TimeMs::now())
        .await?;

    Ok(Json(PayResponse {
        request: request.into(),
    }))
}
