//! # Checkout server
//! This crate hosts the HTTP server in front of the checkout engine. It is responsible for:
//! * Handing out signed payment forms for open baskets, after screening the buyer against the SDN list.
//! * Receiving payment notifications from CyberSource and turning paid baskets into orders.
//! * The free-checkout redirect, the receipt page and the cancel/error pages the gateway sends customers back to.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payment/cybersource/submit`: Returns the signed payment form for a basket. Authenticated.
//! * `/payment/cybersource/notify`: The gateway's payment notification callback. Optionally IP-whitelisted.
//! * `/checkout/free`: Places a free order and redirects to the receipt. Authenticated.
//! * `/checkout/receipt`: Receipt data for an order. Authenticated.
//! * `/checkout/cancel-checkout` and `/checkout/error`: Support details for abandoned or failed checkouts.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod payment_routes;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
