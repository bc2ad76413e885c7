use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutView},
    error::AppResult,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{session_id}", post(checkout))
}

#[utoipa::path(
    post,
    path = "/api/checkout/{session_id}",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Payment outcome, see `status`", body = ApiResponse<CheckoutView>),
        (status = 400, description = "Cart is empty or customer details missing"),
        (status = 409, description = "A payment or coupon lookup is already in progress"),
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutView>>> {
    Ok(Json(
        checkout_service::checkout(&state, session_id, payload).await?,
    ))
}
