use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::{AppliedCoupon, CartLineItem, CartSummary, Coupon, DiscountType, LineKey, PricingPolicy},
    dto::{
        cart::{AddItemRequest, ApplyCouponRequest, CartView, CouponResultView, SetQuantityRequest},
        checkout::{CheckoutRequest, CheckoutStatus, CheckoutView},
        notifications::ToastList,
        orders::{OrderList, OrderWithItems},
    },
    models::{CustomerInfo, Order, OrderItem},
    money::Money,
    notify::{Severity, Toast},
    response::{ApiResponse, Meta},
    routes::{cart, checkout, health, notifications, orders, params},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::create_cart,
        cart::get_cart,
        cart::clear_cart,
        cart::add_item,
        cart::set_quantity,
        cart::remove_item,
        cart::apply_coupon,
        cart::remove_coupon,
        cart::get_summary,
        cart::end_session,
        checkout::checkout,
        notifications::list_notifications,
        notifications::dismiss_notification,
        orders::list_orders,
        orders::get_order
    ),
    components(
        schemas(
            Money,
            LineKey,
            CartLineItem,
            Coupon,
            DiscountType,
            AppliedCoupon,
            CartSummary,
            PricingPolicy,
            AddItemRequest,
            SetQuantityRequest,
            ApplyCouponRequest,
            CartView,
            CouponResultView,
            CustomerInfo,
            CheckoutRequest,
            CheckoutStatus,
            CheckoutView,
            Order,
            OrderItem,
            OrderList,
            OrderWithItems,
            Severity,
            Toast,
            ToastList,
            params::Pagination,
            params::SortOrder,
            params::OrderListQuery,
            Meta,
            ApiResponse<CartView>,
            ApiResponse<CouponResultView>,
            ApiResponse<CheckoutView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ToastList>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Cart", description = "Session cart, coupon and pricing endpoints"),
        (name = "Checkout", description = "Payment and order placement"),
        (name = "Notifications", description = "Transient toasts for the app"),
        (name = "Orders", description = "Placed orders"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
