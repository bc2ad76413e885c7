pub mod cart_service;
pub mod checkout_service;
pub mod coupons;
pub mod order_service;
pub mod orders;
pub mod payment;
