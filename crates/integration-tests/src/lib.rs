//! Integration tests for Vitrine.
//!
//! Provides [`MockBackend`], an in-process stand-in for the commerce API that
//! serves a public and a locked catalogue, issues access grants for
//! [`VALID_CODE`] and records everything the client sends.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vitrine-integration-tests
//! ```
//!
//! # Fixtures
//!
//! - [`PUBLIC_SLUG`] - public catalogue `c1` with two visible products and one hidden
//! - [`LOCKED_SLUG`] - private catalogue `c2`, locked until the bearer token is [`ACCESS_TOKEN`]
//! - [`EMPTY_SLUG`] - answers 200 with an empty body
//! - [`SLOW_SLUG`] - answers after ten seconds, for cancellation tests
//! - [`WRAPPED_SLUG`] - catalogue `c1` wrapped in `{ "data": ... }`
//! - [`STUCK_SLUG`] - public catalogue `c3` whose listing always claims page 1 of 3

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;
use vitrine_client::{ClientConfig, LogFormat};
use vitrine_core::CurrencyCode;

/// The only code the mock accepts.
pub const VALID_CODE: &str = "123456";
/// Bearer token issued for [`VALID_CODE`].
pub const ACCESS_TOKEN: &str = "grant-7f3a";
pub const PUBLIC_SLUG: &str = "spring-open";
pub const LOCKED_SLUG: &str = "members-only";
pub const EMPTY_SLUG: &str = "ghost";
pub const SLOW_SLUG: &str = "slow-lane";
pub const WRAPPED_SLUG: &str = "spring-wrapped";
pub const STUCK_SLUG: &str = "stuck-pager";
/// Orders paid this way are refused with a 422.
pub const REJECTED_PAYMENT: &str = "card";

// =============================================================================
// MockBackend
// =============================================================================

/// Everything the client sent, for assertions.
#[derive(Debug, Default)]
struct Recorded {
    access_requests: Vec<Value>,
    verify_attempts: Vec<String>,
    orders: Vec<Value>,
    product_requests: usize,
    request_ids: Vec<String>,
}

#[derive(Clone, Default)]
struct BackendState {
    recorded: Arc<Mutex<Recorded>>,
}

impl BackendState {
    fn record<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self
            .recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut recorded)
    }

    /// Note the request ID and report whether the caller holds the grant.
    fn observe(&self, headers: &HeaderMap) -> bool {
        if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
            let id = id.to_string();
            self.record(|r| r.request_ids.push(id));
        }
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {ACCESS_TOKEN}"))
    }
}

/// A commerce API running on an ephemeral local port.
pub struct MockBackend {
    base_url: Url,
    state: BackendState,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = BackendState::default();
        let app = Router::new()
            .route("/api/v1/catalogues/view/{slug}", get(get_catalogue))
            .route("/api/v1/catalogues/{id}/products", get(list_products))
            .route("/api/v1/catalogues/{id}/request-access", post(request_access))
            .route("/api/v1/catalogues/{id}/verify-access", post(verify_access))
            .route("/api/v1/orders", post(create_order))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url =
            Url::parse(&format!("http://{addr}/api/v1")).map_err(std::io::Error::other)?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    /// Versioned API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self, state_dir: &Path) -> ClientConfig {
        ClientConfig {
            api_url: self.base_url.clone(),
            state_dir: state_dir.to_path_buf(),
            currency: CurrencyCode::XAF,
            page_size: 20,
            cache_ttl: Duration::from_secs(300),
            http_timeout: Some(Duration::from_secs(30)),
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[must_use]
    pub fn access_requests(&self) -> Vec<Value> {
        self.state.record(|r| r.access_requests.clone())
    }

    #[must_use]
    pub fn verify_attempts(&self) -> Vec<String> {
        self.state.record(|r| r.verify_attempts.clone())
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.state.record(|r| r.orders.clone())
    }

    /// Number of product listing requests received.
    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.state.record(|r| r.product_requests)
    }

    #[must_use]
    pub fn request_ids(&self) -> Vec<String> {
        self.state.record(|r| r.request_ids.clone())
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn public_catalogue() -> Value {
    json!({
        "id": "c1",
        "businessId": "b1",
        "name": "Spring Open",
        "slug": PUBLIC_SLUG,
        "type": "public",
        "isActive": true,
        "allowCloning": false
    })
}

fn locked_catalogue(locked: bool) -> Value {
    json!({
        "id": "c2",
        "businessId": "b2",
        "name": "Members Only",
        "slug": LOCKED_SLUG,
        "type": "private",
        "isActive": true,
        "allowCloning": false,
        "isLocked": locked
    })
}

fn stuck_catalogue() -> Value {
    json!({
        "id": "c3",
        "businessId": "b3",
        "name": "Stuck Pager",
        "slug": STUCK_SLUG,
        "type": "public"
    })
}

fn stuck_products() -> Vec<Value> {
    vec![json!({
        "id": "cp30",
        "catalogueId": "c3",
        "productId": "p30",
        "basePrice": "500",
        "product": { "id": "p30", "name": "Matches" }
    })]
}

fn public_products() -> Vec<Value> {
    vec![
        json!({
            "id": "cp1",
            "catalogueId": "c1",
            "productId": "p1",
            "basePrice": "1000",
            "isHidden": false,
            "unitPrices": [{ "unitId": "carton", "price": "11000" }],
            "product": {
                "id": "p1",
                "name": "Palm oil 1L",
                "units": [
                    { "id": "bottle", "name": "Bottle" },
                    { "id": "carton", "name": "Carton of 12", "price": "11500" },
                    { "id": "crate", "name": "Crate of 24", "price": "21000" }
                ]
            }
        }),
        json!({
            "id": "cp2",
            "catalogueId": "c1",
            "productId": "p2",
            "basePrice": 2500,
            "isHidden": false,
            "product": { "id": "p2", "name": "Shea butter" }
        }),
        json!({
            "id": "cp3",
            "catalogueId": "c1",
            "productId": "p3",
            "basePrice": "700",
            "isHidden": true,
            "product": { "id": "p3", "name": "Discontinued soap" }
        }),
    ]
}

fn locked_products() -> Vec<Value> {
    vec![json!({
        "id": "cp10",
        "catalogueId": "c2",
        "productId": "p10",
        "basePrice": "4000",
        "product": { "id": "p10", "name": "Members coffee 500g" }
    })]
}

// =============================================================================
// Handlers
// =============================================================================

fn error(status: StatusCode, message: Value) -> Response {
    (
        status,
        Json(json!({ "message": message, "statusCode": status.as_u16() })),
    )
        .into_response()
}

async fn get_catalogue(
    State(state): State<BackendState>,
    UrlPath(slug): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    let authorized = state.observe(&headers);
    match slug.as_str() {
        PUBLIC_SLUG => Json(public_catalogue()).into_response(),
        LOCKED_SLUG => Json(locked_catalogue(!authorized)).into_response(),
        EMPTY_SLUG => StatusCode::OK.into_response(),
        WRAPPED_SLUG => {
            Json(json!({ "data": public_catalogue(), "statusCode": 200 })).into_response()
        }
        STUCK_SLUG => Json(stuck_catalogue()).into_response(),
        SLOW_SLUG => {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(public_catalogue()).into_response()
        }
        _ => error(StatusCode::NOT_FOUND, json!("Catalogue not found")),
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_products(
    State(state): State<BackendState>,
    UrlPath(id): UrlPath<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let authorized = state.observe(&headers);
    state.record(|r| r.product_requests += 1);

    let items = match id.as_str() {
        "c1" => public_products(),
        "c2" if authorized => locked_products(),
        "c2" => {
            return error(
                StatusCode::FORBIDDEN,
                json!("Access to this catalogue has not been granted"),
            );
        }
        "c3" => {
            return Json(json!({
                "data": stuck_products(),
                "meta": { "page": 1, "limit": 1, "total": 3, "totalPages": 3 }
            }))
            .into_response();
        }
        _ => return error(StatusCode::NOT_FOUND, json!("Catalogue not found")),
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).max(1);
    let total = items.len();
    let data: Vec<Value> = items
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Json(json!({
        "data": data,
        "meta": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total.div_ceil(limit)
        }
    }))
    .into_response()
}

async fn request_access(
    State(state): State<BackendState>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.observe(&headers);
    if id != "c1" && id != "c2" {
        return error(StatusCode::NOT_FOUND, json!("Catalogue not found"));
    }

    let has_name = body
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|n| !n.trim().is_empty());
    let has_contact = body.get("email").is_some() || body.get("phone").is_some();
    if !has_name || !has_contact {
        return error(
            StatusCode::BAD_REQUEST,
            json!(["name should not be empty", "email or phone is required"]),
        );
    }

    state.record(|r| r.access_requests.push(body));
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Access code sent" })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct VerifyBody {
    code: String,
}

async fn verify_access(
    State(state): State<BackendState>,
    UrlPath(_id): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<VerifyBody>,
) -> Response {
    state.observe(&headers);
    let accepted = body.code == VALID_CODE;
    state.record(|r| r.verify_attempts.push(body.code));

    if accepted {
        Json(json!({ "access_token": ACCESS_TOKEN })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, json!("Invalid or expired code"))
    }
}

async fn create_order(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.observe(&headers);

    if body.get("paymentMethod").and_then(Value::as_str) == Some(REJECTED_PAYMENT) {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!(["card payments are not available for this business"]),
        );
    }

    let total: i64 = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let quantity = item.get("quantity").and_then(Value::as_i64).unwrap_or(0);
                    let price = item
                        .get("unitPrice")
                        .and_then(Value::as_str)
                        .and_then(|p| p.parse::<i64>().ok())
                        .unwrap_or(0);
                    quantity * price
                })
                .sum()
        })
        .unwrap_or(0);

    let id = state.record(|r| {
        r.orders.push(body);
        format!("order-{}", r.orders.len())
    });

    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "status": "pending",
            "totalAmount": total.to_string(),
            "createdAt": "2026-03-01T10:00:00Z"
        })),
    )
        .into_response()
}
