use chrono::Utc;
use uuid::Uuid;

use crate::{
    cart::{CartSummary, CouponCleared, CouponLookup, CouponResult, LineKey},
    dto::{
        cart::{AddItemRequest, ApplyCouponRequest, CartView, CouponResultView, SetQuantityRequest},
        notifications::ToastList,
    },
    error::{AppError, AppResult, CartError},
    notify::Severity,
    response::{ApiResponse, Meta},
    session::CartSession,
    state::AppState,
};

pub fn create_cart(state: &AppState) -> AppResult<ApiResponse<CartView>> {
    let session_id = state.sessions.create();
    tracing::info!(%session_id, "cart session created");
    get_cart(state, session_id).map(|mut resp| {
        resp.message = "Cart created".to_string();
        resp
    })
}

pub fn get_cart(state: &AppState, session_id: Uuid) -> AppResult<ApiResponse<CartView>> {
    let view = state
        .sessions
        .with_session(session_id, |s| CartView::new(session_id, &s.cart, &state.pricing))?;
    Ok(ApiResponse::ok(view))
}

pub fn clear_cart(state: &AppState, session_id: Uuid) -> AppResult<ApiResponse<CartView>> {
    let view = state
        .sessions
        .with_session(session_id, |s| -> Result<CartView, CartError> {
            s.cart_mut()?.clear();
            Ok(CartView::new(session_id, &s.cart, &state.pricing))
        })??;
    tracing::info!(%session_id, "cart cleared");
    Ok(ApiResponse::success("Cart cleared", view, Some(Meta::empty())))
}

pub fn add_item(
    state: &AppState,
    session_id: Uuid,
    payload: AddItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    let product_id = payload.product_id;
    let quantity = payload.quantity;
    let view = state
        .sessions
        .with_session(session_id, |s| -> Result<CartView, CartError> {
            s.cart_mut()?.add_item(payload.into())?;
            Ok(CartView::new(session_id, &s.cart, &state.pricing))
        })??;

    tracing::info!(%session_id, %product_id, quantity, "item added");
    Ok(ApiResponse::success("Added to cart", view, Some(Meta::empty())))
}

pub fn set_quantity(
    state: &AppState,
    session_id: Uuid,
    payload: SetQuantityRequest,
) -> AppResult<ApiResponse<CartView>> {
    let key = payload.key();
    let view = state
        .sessions
        .with_session(session_id, |s| -> Result<CartView, CartError> {
            let cleared = s.cart_mut()?.set_quantity(&key, payload.quantity)?;
            notify_cleared(s, cleared);
            Ok(CartView::new(session_id, &s.cart, &state.pricing))
        })??;

    tracing::info!(%session_id, product_id = %key.product_id, quantity = payload.quantity, "quantity set");
    Ok(ApiResponse::success("Cart updated", view, Some(Meta::empty())))
}

pub fn remove_item(
    state: &AppState,
    session_id: Uuid,
    key: LineKey,
) -> AppResult<ApiResponse<CartView>> {
    let view = state
        .sessions
        .with_session(session_id, |s| -> Result<CartView, CartError> {
            let cleared = s.cart_mut()?.remove_item(&key)?;
            notify_cleared(s, cleared);
            Ok(CartView::new(session_id, &s.cart, &state.pricing))
        })??;

    tracing::info!(%session_id, product_id = %key.product_id, "item removed");
    Ok(ApiResponse::success("Removed from cart", view, Some(Meta::empty())))
}

/// Coupon failures come back as `applied: false` with a toast, never as an error status.
pub async fn apply_coupon(
    state: &AppState,
    session_id: Uuid,
    payload: ApplyCouponRequest,
) -> AppResult<ApiResponse<CouponResultView>> {
    let lookup = state.sessions.with_session(session_id, |s| {
        s.cart_mut()
            .and_then(|cart| cart.begin_coupon_lookup(&payload.code))
    })?;

    let result = match lookup {
        Ok(lookup) => {
            let mut slot = PendingLookup {
                state,
                session_id,
                lookup: lookup.clone(),
                armed: true,
            };
            let fetched = state.coupons.fetch_coupon_by_code(&lookup.code).await;
            if let Err(err) = &fetched {
                tracing::warn!(%session_id, code = %lookup.code, error = %err, "coupon lookup failed");
            }
            slot.armed = false;
            state.sessions.with_session(session_id, |s| {
                s.cart.complete_coupon_lookup(lookup, fetched, Utc::now())
            })?
        }
        Err(err) => CouponResult::rejected(err),
    };

    match &result.failure {
        None => tracing::info!(%session_id, discount = result.discount.paise(), "coupon applied"),
        Some(err) => tracing::info!(%session_id, reason = %err, "coupon rejected"),
    }

    let cart = state.sessions.with_session(session_id, |s| {
        let severity = if result.applied {
            Severity::Success
        } else {
            Severity::Error
        };
        s.toasts.push(result.message.clone(), severity, Utc::now());
        CartView::new(session_id, &s.cart, &state.pricing)
    })?;

    let message = result.message.clone();
    let view = CouponResultView {
        applied: result.applied,
        message: result.message,
        discount: result.discount,
        cart,
    };
    Ok(ApiResponse::success(message, view, Some(Meta::empty())))
}

pub fn remove_coupon(state: &AppState, session_id: Uuid) -> AppResult<ApiResponse<CartView>> {
    let (removed, view) = state.sessions.with_session(
        session_id,
        |s| -> Result<(bool, CartView), CartError> {
            let removed = s.cart_mut()?.remove_coupon();
            Ok((removed, CartView::new(session_id, &s.cart, &state.pricing)))
        },
    )??;

    if removed {
        tracing::info!(%session_id, "coupon removed");
    }
    Ok(ApiResponse::success("Coupon removed", view, Some(Meta::empty())))
}

/// Forget the session. Refused while its payment is in flight.
pub fn end_session(state: &AppState, session_id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    state.sessions.remove(session_id)?;
    tracing::info!(%session_id, "cart session ended");
    Ok(ApiResponse::success(
        "Session ended",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn get_summary(state: &AppState, session_id: Uuid) -> AppResult<ApiResponse<CartSummary>> {
    let summary = state
        .sessions
        .with_session(session_id, |s| s.cart.summary(&state.pricing))?;
    Ok(ApiResponse::ok(summary))
}

pub fn list_notifications(state: &AppState, session_id: Uuid) -> AppResult<ApiResponse<ToastList>> {
    let items = state
        .sessions
        .with_session(session_id, |s| s.toasts.visible(Utc::now()))?;
    Ok(ApiResponse::ok(ToastList { items }))
}

pub fn dismiss_notification(
    state: &AppState,
    session_id: Uuid,
    toast_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let dismissed = state
        .sessions
        .with_session(session_id, |s| s.toasts.dismiss(toast_id))?;
    if !dismissed {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Dismissed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn notify_cleared(session: &mut CartSession, cleared: Option<CouponCleared>) {
    if let Some(cleared) = cleared {
        tracing::info!(code = %cleared.code, "coupon cleared below minimum order");
        session
            .toasts
            .push(cleared.message(), Severity::Warning, Utc::now());
    }
}

/// Gives the coupon slot back if the request is dropped mid-lookup.
struct PendingLookup<'a> {
    state: &'a AppState,
    session_id: Uuid,
    lookup: CouponLookup,
    armed: bool,
}

impl Drop for PendingLookup<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let released = self
            .state
            .sessions
            .with_session(self.session_id, |s| s.cart.abandon_coupon_lookup(&self.lookup));
        if let Ok(true) = released {
            tracing::info!(session_id = %self.session_id, code = %self.lookup.code, "coupon lookup abandoned");
        }
    }
}
