use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{cart::CartSummary, dto::orders::OrderWithItems, models::CustomerInfo};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub customer: CustomerInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    Paid,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutView {
    pub status: CheckoutStatus,
    pub message: String,
    /// What was charged, or would have been.
    pub summary: CartSummary,
    pub order: Option<OrderWithItems>,
}
