//! Shopping cart, coupon and checkout service for the storefront app.
//!
//! The [`cart`] module holds the pricing logic and can be used on its own;
//! the rest wires it to Postgres, a payment gateway and an axum HTTP API.

pub mod cart;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod models;
pub mod money;
pub mod notify;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
