use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::order::{Order, OrderStatus};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub external_transaction_id: String,
    /// PENDING, ACTIVE or COMPLETED
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    /// Decimal amount as a string, e.g. "29.99"
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub plan_description: Option<String>,
    pub computed_savings: Option<String>,
    pub expiry_date: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub raw_gateway_payload: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        OrderResponse {
            id: o.id.to_string(),
            external_transaction_id: o.external_transaction_id,
            status: o.status.to_string(),
            customer_name: o.customer_name,
            customer_email: o.customer_email,
            amount: o.amount.map(|a| a.with_scale(2).to_string()),
            currency: o.currency,
            plan_description: o.plan_description,
            computed_savings: o.computed_savings.map(|s| s.with_scale(2).to_string()),
            expiry_date: o.expiry_date.map(|d| d.to_rfc3339()),
            raw_gateway_payload: o.raw_gateway_payload,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only orders in this status (PENDING, ACTIVE or COMPLETED).
    pub status: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Auth ─────────────────────────────────────────────────────────────────────

/// Admin endpoints take `Authorization: Bearer <token>`. With no token configured nothing gets in.
fn require_admin(req: &HttpRequest, state: &AppState) -> Result<(), AppError> {
    let Some(expected) = state.admin_token.as_ref() else {
        return Err(AppError::Unauthorized("Admin API is disabled".to_string()));
    };
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    match presented {
        Some(token) if constant_time_eq(token.as_bytes(), expected.reveal().as_bytes()) => Ok(()),
        _ => Err(AppError::Unauthorized("Missing or invalid admin token".to_string())),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders/{transaction_id}
#[utoipa::path(
    get,
    path = "/orders/{transaction_id}",
    params(
        ("transaction_id" = String, Path, description = "Gateway transaction id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("admin_token" = [])),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &state)?;
    let transaction_id = path.into_inner();

    let orders = state.orders.clone();
    let order = web::block(move || orders.get_order(&transaction_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders
///
/// Returns a paginated list of orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 500, description = "Internal server error"),
    ),
    security(("admin_token" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &state)?;
    let params = query.into_inner();
    let status = params.status.as_deref().map(|s| s.to_ascii_uppercase().parse::<OrderStatus>()).transpose()?;
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let orders = state.orders.clone();
    let result = web::block(move || orders.list_orders(page, limit, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// POST /orders/{transaction_id}/complete
///
/// Marks a paid order as delivered. Pending orders are refused with 409.
#[utoipa::path(
    post,
    path = "/orders/{transaction_id}/complete",
    params(
        ("transaction_id" = String, Path, description = "Gateway transaction id"),
    ),
    responses(
        (status = 200, description = "Order is COMPLETED", body = OrderResponse),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order has not been paid"),
        (status = 500, description = "Internal server error"),
    ),
    security(("admin_token" = [])),
    tag = "orders"
)]
pub async fn complete_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_admin(&req, &state)?;
    let transaction_id = path.into_inner();

    let orders = state.orders.clone();
    let order = web::block(move || orders.complete_order(&transaction_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
