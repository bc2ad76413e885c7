use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::notifications::ToastList, error::AppResult, response::ApiResponse, services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{session_id}", get(list_notifications))
        .route("/{session_id}/{toast_id}", delete(dismiss_notification))
}

#[utoipa::path(
    get,
    path = "/api/notifications/{session_id}",
    params(("session_id" = Uuid, Path, description = "Cart session ID")),
    responses(
        (status = 200, description = "Unexpired toasts, oldest first", body = ApiResponse<ToastList>),
        (status = 404, description = "Unknown session"),
    ),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ToastList>>> {
    Ok(Json(cart_service::list_notifications(&state, session_id)?))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{session_id}/{toast_id}",
    params(
        ("session_id" = Uuid, Path, description = "Cart session ID"),
        ("toast_id" = Uuid, Path, description = "Toast ID")
    ),
    responses(
        (status = 200, description = "Toast dismissed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Unknown session or toast"),
    ),
    tag = "Notifications"
)]
pub async fn dismiss_notification(
    State(state): State<AppState>,
    Path((session_id, toast_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(cart_service::dismiss_notification(
        &state, session_id, toast_id,
    )?))
}
