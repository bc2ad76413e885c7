use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutStatus, CheckoutView},
    error::{AppError, AppResult, CartError},
    notify::Severity,
    response::{ApiResponse, Meta},
    services::{
        orders::NewOrder,
        payment::{PaymentOutcome, PaymentRequest},
    },
    state::AppState,
};

/// Pay for the session's cart and record the order.
///
/// One gateway call per invocation. A captured payment empties the cart; a
/// failed or cancelled one leaves it as it was.
pub async fn checkout(
    state: &AppState,
    session_id: Uuid,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutView>> {
    let customer = payload.customer;
    if customer.name.trim().is_empty() || customer.email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "customer name and email are required".to_string(),
        ));
    }

    let (summary, items, coupon_code) = state
        .sessions
        .with_session(session_id, |s| {
            if s.payment_in_flight {
                return Err(CartError::CheckoutInProgress);
            }
            if s.cart.is_empty() {
                return Err(CartError::EmptyCart);
            }
            if s.cart.lookup_in_flight() {
                return Err(CartError::CouponLookupInProgress);
            }
            s.payment_in_flight = true;
            Ok((
                s.cart.summary(&state.pricing),
                s.cart.items().to_vec(),
                s.cart.applied_coupon().map(|c| c.coupon.code.clone()),
            ))
        })??;

    let payment = PaymentInFlight {
        state,
        session_id,
        finished: false,
    };

    let order_id = Uuid::new_v4();
    tracing::info!(%session_id, %order_id, total = summary.total.paise(), "payment started");

    let outcome = state
        .payments
        .initiate_payment(PaymentRequest {
            order_id,
            amount: summary.total,
            customer: customer.clone(),
        })
        .await;

    match outcome {
        PaymentOutcome::Captured(receipt) => {
            let payment_id = receipt.payment_id.clone();
            let persisted = state
                .orders
                .persist_order(NewOrder {
                    id: order_id,
                    customer,
                    summary,
                    coupon_code,
                    payment: receipt,
                    items,
                })
                .await;

            let order = match persisted {
                Ok(order) => order,
                Err(err) => {
                    tracing::error!(%session_id, %order_id, %payment_id, error = %err, "paid order could not be saved");
                    payment.finish(
                        false,
                        "Payment received but the order could not be saved. Please contact support",
                        Severity::Error,
                    );
                    return Err(err);
                }
            };

            let message = format!("Order placed. Paid {}", summary.total);
            payment.finish(true, &message, Severity::Success);
            tracing::info!(%session_id, %order_id, %payment_id, "order placed");

            Ok(ApiResponse::success(
                message.clone(),
                CheckoutView {
                    status: CheckoutStatus::Paid,
                    message,
                    summary,
                    order: Some(order),
                },
                Some(Meta::empty()),
            ))
        }
        PaymentOutcome::Failed(failure) => {
            tracing::warn!(%session_id, %order_id, code = %failure.code, reason = %failure.description, "payment failed");
            let message = CartError::PaymentFailed(failure.description).user_message();
            payment.finish(false, &message, Severity::Error);
            Ok(ApiResponse::success(
                message.clone(),
                CheckoutView {
                    status: CheckoutStatus::Failed,
                    message,
                    summary,
                    order: None,
                },
                Some(Meta::empty()),
            ))
        }
        PaymentOutcome::Cancelled => {
            tracing::info!(%session_id, %order_id, "payment cancelled by customer");
            let message = CartError::PaymentCancelled.user_message();
            payment.finish(false, &message, Severity::Info);
            Ok(ApiResponse::success(
                message.clone(),
                CheckoutView {
                    status: CheckoutStatus::Cancelled,
                    message,
                    summary,
                    order: None,
                },
                Some(Meta::empty()),
            ))
        }
    }
}

/// Holds the session's payment flag. Dropping it unfinished, as happens when
/// the request is cancelled mid-payment, releases the flag and keeps the cart.
struct PaymentInFlight<'a> {
    state: &'a AppState,
    session_id: Uuid,
    finished: bool,
}

impl PaymentInFlight<'_> {
    /// Release the flag and tell the customer how it went.
    fn finish(mut self, paid: bool, message: &str, severity: Severity) {
        self.finished = true;
        let released = self.state.sessions.with_session(self.session_id, |s| {
            s.payment_in_flight = false;
            if paid {
                s.cart.clear();
            }
            s.toasts.push(message, severity, Utc::now());
        });
        if released.is_err() {
            tracing::warn!(session_id = %self.session_id, "session ended before payment finished");
        }
    }
}

impl Drop for PaymentInFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let _ = self
            .state
            .sessions
            .with_session(self.session_id, |s| s.payment_in_flight = false);
        tracing::warn!(session_id = %self.session_id, "checkout dropped before the payment settled");
    }
}
