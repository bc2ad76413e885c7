use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, _) = query.pagination().normalize();
    let (orders, total) = state.orders.list_orders(&query).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = state.orders.get_order(id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(order))
}
