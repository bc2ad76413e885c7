use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    cart::{CartSummary, LineKey},
    dto::cart::{AddItemRequest, ApplyCouponRequest, CartView, CouponResultView, SetQuantityRequest},
    error::AppResult,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/{session_id}", get(get_cart).delete(clear_cart))
        .route(
            "/{session_id}/items",
            post(add_item).put(set_quantity).delete(remove_item),
        )
        .route(
            "/{session_id}/coupon",
            post(apply_coupon).delete(remove_coupon),
        )
        .route("/{session_id}/summary", get(get_summary))
        .route("/{session_id}/session", delete(end_session))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    responses(
        (status = 200, description = "New empty cart session", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn create_cart(State(state): State<AppState>) -> AppResult<Json<ApiResponse<CartView>>> {
    Ok(Json(cart_service::create_cart(&state)?))
}

#[utoipa::path(
    get,
    path = "/api/cart/{session_id}",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    responses(
        (status = 200, description = "Cart with pricing summary", body = ApiResponse<CartView>),
        (status = 404, description = "Unknown session"),
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    Ok(Json(cart_service::get_cart(&state, session_id)?))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{session_id}",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "A payment is in progress"),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    Ok(Json(cart_service::clear_cart(&state, session_id)?))
}

#[utoipa::path(
    post,
    path = "/api/cart/{session_id}/items",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added or merged", body = ApiResponse<CartView>),
        (status = 400, description = "Bad request"),
        (status = 409, description = "A payment is in progress"),
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    Ok(Json(cart_service::add_item(&state, session_id, payload)?))
}

#[utoipa::path(
    put,
    path = "/api/cart/{session_id}/items",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity replaced, zero removes", body = ApiResponse<CartView>),
        (status = 404, description = "Line not in cart"),
        (status = 409, description = "A payment is in progress"),
    ),
    tag = "Cart"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    Ok(Json(cart_service::set_quantity(&state, session_id, payload)?))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{session_id}/items",
    params(
        ("session_id" = Uuid, Path, description = "Cart session ID"),
        ("product_id" = Uuid, Query, description = "Product ID"),
        ("size" = Option<String>, Query, description = "Size, empty when the product has none"),
        ("color" = Option<String>, Query, description = "Color, empty when the product has none")
    ),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartView>),
        (status = 404, description = "Line not in cart"),
        (status = 409, description = "A payment is in progress"),
    ),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(key): Query<LineKey>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    Ok(Json(cart_service::remove_item(&state, session_id, key)?))
}

#[utoipa::path(
    post,
    path = "/api/cart/{session_id}/coupon",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Coupon outcome, see `applied`", body = ApiResponse<CouponResultView>),
        (status = 404, description = "Unknown session"),
    ),
    tag = "Cart"
)]
pub async fn apply_coupon(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponResultView>>> {
    Ok(Json(
        cart_service::apply_coupon(&state, session_id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{session_id}/coupon",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    responses(
        (status = 200, description = "Coupon removed", body = ApiResponse<CartView>),
        (status = 409, description = "A payment is in progress"),
    ),
    tag = "Cart"
)]
pub async fn remove_coupon(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    Ok(Json(cart_service::remove_coupon(&state, session_id)?))
}

#[utoipa::path(
    get,
    path = "/api/cart/{session_id}/summary",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    responses(
        (status = 200, description = "Pricing breakdown", body = ApiResponse<CartSummary>),
    ),
    tag = "Cart"
)]
pub async fn get_summary(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    Ok(Json(cart_service::get_summary(&state, session_id)?))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{session_id}/session",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    responses(
        (status = 200, description = "Session and its cart discarded", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "A payment is in progress"),
    ),
    tag = "Cart"
)]
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(cart_service::end_session(&state, session_id)?))
}
