use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// Shown for every coupon that cannot be used, whatever the reason.
pub const COUPON_REJECTED_MESSAGE: &str = "This coupon is invalid or not applicable to your cart";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// Recoverable cart, coupon and payment failures.
///
/// None of these abort a session. Coupon and payment variants travel back to
/// the app inside result values and toasts; the rest become 4xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("coupon {code} not found, inactive or expired")]
    CouponInvalid { code: String },

    #[error("coupon {code} needs a subtotal of at least {required} paise, cart has {subtotal}")]
    CouponBelowMinimum {
        code: String,
        required: i64,
        subtotal: i64,
    },

    #[error("a coupon lookup is already in flight for this cart")]
    CouponLookupInProgress,

    #[error("coupon store unavailable: {0}")]
    CouponUnavailable(String),

    #[error("cart was cleared while the coupon lookup was in flight")]
    StaleCart,

    #[error("line item not in cart")]
    LineNotFound,

    #[error("quantity must be between 1 and the per-line limit, got {0}")]
    InvalidQuantity(i64),

    #[error("unit price must be between 0 and the per-item limit, got {0}")]
    InvalidPrice(i64),

    #[error("cart subtotal would exceed the maximum order value")]
    CartLimitExceeded,

    #[error("cart is empty")]
    EmptyCart,

    #[error("a payment is already in progress for this cart")]
    CheckoutInProgress,

    #[error("payment failed: {0}")]
    PaymentFailed(String),

    #[error("payment cancelled by user")]
    PaymentCancelled,
}

impl CartError {
    /// Text suitable for a toast in the app.
    pub fn user_message(&self) -> String {
        match self {
            CartError::CouponInvalid { .. } | CartError::CouponBelowMinimum { .. } => {
                COUPON_REJECTED_MESSAGE.to_string()
            }
            CartError::CouponLookupInProgress => "Please wait, checking your coupon".to_string(),
            CartError::CouponUnavailable(_) => {
                "Could not verify the coupon right now, please try again".to_string()
            }
            CartError::StaleCart => "Your cart changed, please apply the coupon again".to_string(),
            CartError::LineNotFound => "That item is no longer in your cart".to_string(),
            CartError::InvalidQuantity(_) => "Quantity is out of range".to_string(),
            CartError::InvalidPrice(_) => "Item price is invalid".to_string(),
            CartError::CartLimitExceeded => "Your cart is over the maximum order value".to_string(),
            CartError::EmptyCart => "Your cart is empty".to_string(),
            CartError::CheckoutInProgress => "Your payment is already being processed".to_string(),
            CartError::PaymentFailed(_) => "Payment failed, please try again".to_string(),
            CartError::PaymentCancelled => "Payment cancelled".to_string(),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::LineNotFound => AppError::NotFound,
            CartError::CouponLookupInProgress | CartError::CheckoutInProgress => {
                AppError::Conflict(err.user_message())
            }
            _ => AppError::BadRequest(err.user_message()),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
