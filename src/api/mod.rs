pub mod admin;
pub mod health;
pub mod payouts;

use crate::auth::{Caller, IdentityProvider};
use crate::db::Repository;
use crate::domain::Role;
use crate::error::AppError;
use crate::orchestration::CommissionService;
use axum::http::{header, HeaderMap};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub commissions: CommissionService,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            commissions: CommissionService::new(repo.clone()),
            repo,
            identity,
        }
    }
}

/// Resolve the request's bearer credential to a caller.
///
/// Missing or malformed Authorization headers and unknown tokens both fail
/// closed with 401.
pub(crate) async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Caller, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer credential".to_string()))?;

    Ok(state.identity.resolve(token).await?)
}

/// Fail closed with 403 unless the caller has the required role.
pub(crate) fn require_role(caller: &Caller, role: Role) -> Result<(), AppError> {
    if caller.role == role {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} role required",
            role.as_str()
        )))
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/partner/commissions", post(payouts::request_payout))
        .route("/v1/admin/commissions", get(admin::list_commissions))
        .route("/v1/admin/commissions/:id/pay", post(admin::pay_commission))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PartnerId;

    #[test]
    fn test_require_role() {
        let caller = Caller {
            profile_id: PartnerId::new("p-1".to_string()),
            role: Role::Partner,
        };
        assert!(require_role(&caller, Role::Partner).is_ok());
        assert!(matches!(
            require_role(&caller, Role::Admin),
            Err(AppError::Forbidden(_))
        ));
    }
}
