use axum::http::StatusCode;
use revealsongs::api;
use revealsongs::db::init_db;
use revealsongs::domain::{
    CommissionRequest, Currency, PartnerId, RequestStatus, Role, SaleTypeBreakdown, TimeMs,
};
use revealsongs::{IdentityProvider, MockIdentityProvider, Repository};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let identity: Arc<dyn IdentityProvider> = Arc::new(
        MockIdentityProvider::new()
            .with_caller("admin-tok", "a-1", Role::Admin)
            .with_caller("partner-tok", "p-1", Role::Partner),
    );
    let state = api::AppState::new(repo.clone(), identity);
    let app = api::create_router(state);

    TestApp {
        app,
        repo,
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn pending_request(id: &str, partner_name: &str, coupon: &str, requested_at: i64) -> CommissionRequest {
    CommissionRequest {
        id: id.to_string(),
        partner_id: PartnerId::new("p-1".to_string()),
        partner_name: partner_name.to_string(),
        partner_coupon: coupon.to_string(),
        total_commission_amount: 3000,
        subscription: SaleTypeBreakdown {
            count: 1,
            commission_amount: 1000,
        },
        credit_pack: SaleTypeBreakdown {
            count: 1,
            commission_amount: 2000,
        },
        sales_count: 2,
        currency: Currency::new("BRL".to_string()),
        status: RequestStatus::Pending,
        requested_at: TimeMs::new(requested_at),
        paid_at: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_list_requires_admin() {
    let test_app = setup_test_app().await;

    let (status, _) = request(test_app.app.clone(), "GET", "/v1/admin/commissions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        test_app.app,
        "GET",
        "/v1/admin/commissions",
        Some("partner-tok"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_returns_requests_newest_first() {
    let test_app = setup_test_app().await;

    test_app
        .repo
        .insert_commission_request(&pending_request("req-1", "Maria", "MARIA10", 1000))
        .await
        .unwrap();
    test_app
        .repo
        .insert_commission_request(&pending_request("req-2", "Joao", "JOAO5", 2000))
        .await
        .unwrap();

    let (status, body) = request(
        test_app.app,
        "GET",
        "/v1/admin/commissions",
        Some("admin-tok"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let requests = body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["id"], "req-2");
    assert_eq!(requests[1]["id"], "req-1");
    assert_eq!(requests[1]["partnerName"], "Maria");
    assert_eq!(requests[1]["totalCommissionAmount"], 3000);
    assert_eq!(requests[1]["status"], "pending");
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let test_app = setup_test_app().await;

    test_app
        .repo
        .insert_commission_request(&pending_request("req-1", "Maria", "MARIA10", 1000))
        .await
        .unwrap();
    let mut paid = pending_request("req-2", "Joao", "JOAO5", 2000);
    paid.status = RequestStatus::Paid;
    paid.paid_at = Some(TimeMs::new(3000));
    test_app.repo.insert_commission_request(&paid).await.unwrap();

    let (status, body) = request(
        test_app.app.clone(),
        "GET",
        "/v1/admin/commissions?status=paid",
        Some("admin-tok"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let requests = body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["id"], "req-2");
    assert_eq!(requests[0]["paidAt"], 3000);

    let (status, _) = request(
        test_app.app,
        "GET",
        "/v1/admin/commissions?status=bogus",
        Some("admin-tok"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_searches_partner_name_and_coupon() {
    let test_app = setup_test_app().await;

    test_app
        .repo
        .insert_commission_request(&pending_request("req-1", "Maria", "MARIA10", 1000))
        .await
        .unwrap();
    test_app
        .repo
        .insert_commission_request(&pending_request("req-2", "Joao", "JOAO5", 2000))
        .await
        .unwrap();

    let (_status, body) = request(
        test_app.app.clone(),
        "GET",
        "/v1/admin/commissions?search=maria",
        Some("admin-tok"),
        None,
    )
    .await;
    let requests = body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["partnerName"], "Maria");

    let (_status, body) = request(
        test_app.app,
        "GET",
        "/v1/admin/commissions?search=JOAO5",
        Some("admin-tok"),
        None,
    )
    .await;
    let requests = body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["partnerCoupon"], "JOAO5");
}

#[tokio::test]
async fn test_pay_requires_admin() {
    let test_app = setup_test_app().await;

    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/v1/admin/commissions/req-1/pay",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        test_app.app,
        "POST",
        "/v1/admin/commissions/req-1/pay",
        Some("partner-tok"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_pay_unknown_request_is_not_found() {
    let test_app = setup_test_app().await;

    let (status, _) = request(
        test_app.app,
        "POST",
        "/v1/admin/commissions/no-such-id/pay",
        Some("admin-tok"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pay_marks_request_paid_with_notes() {
    let test_app = setup_test_app().await;

    test_app
        .repo
        .insert_commission_request(&pending_request("req-1", "Maria", "MARIA10", 1000))
        .await
        .unwrap();

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/admin/commissions/req-1/pay",
        Some("admin-tok"),
        Some(serde_json::json!({"notes": "wire #42"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "paid");
    assert_eq!(body["request"]["notes"], "wire #42");
    assert!(body["request"]["paidAt"].is_i64());

    let stored = test_app
        .repo
        .get_commission_request("req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, RequestStatus::Paid);
    assert!(stored.paid_at.is_some());
}

#[tokio::test]
async fn test_pay_is_idempotent() {
    let test_app = setup_test_app().await;

    test_app
        .repo
        .insert_commission_request(&pending_request("req-1", "Maria", "MARIA10", 1000))
        .await
        .unwrap();

    let (status, first) = request(
        test_app.app.clone(),
        "POST",
        "/v1/admin/commissions/req-1/pay",
        Some("admin-tok"),
        Some(serde_json::json!({"notes": "first"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = request(
        test_app.app,
        "POST",
        "/v1/admin/commissions/req-1/pay",
        Some("admin-tok"),
        Some(serde_json::json!({"notes": "second"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["request"]["paidAt"], first["request"]["paidAt"]);
    assert_eq!(second["request"]["notes"], "first");
}

#[tokio::test]
async fn test_pay_accepts_empty_body() {
    let test_app = setup_test_app().await;

    test_app
        .repo
        .insert_commission_request(&pending_request("req-1", "Maria", "MARIA10", 1000))
        .await
        .unwrap();

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/admin/commissions/req-1/pay",
        Some("admin-tok"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], "paid");
    assert!(body["request"].get("notes").is_none());
}
