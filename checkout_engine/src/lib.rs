//! Checkout Engine
//!
//! The checkout engine contains the core logic behind a course store's checkout: turning a basket into a signed
//! payment form for a hosted payment page, and turning the payment gateway's notification into an order. It is
//! independent of any web framework.
//!
//! The library is divided into these sections:
//! 1. Storage ([`traits`] and [`SqliteDatabase`]). The traits define what a backend must do. SQLite is the supported
//!    backend. The data types stored by backends live in [`db_types`] and are public.
//! 2. Payment processors ([`processors`]). These know the wire format of a specific gateway, currently CyberSource
//!    Secure Acceptance.
//! 3. The public API: [`AccountApi`], [`CheckoutFlowApi`] and [`PaymentApi`]. Each is created by handing it a backend
//!    that implements the traits it needs.
//!
//! [`helpers`] holds the order number encoding and the site configuration, including the receipt URL builder, and
//! [`offers`] re-applies voucher discounts to baskets.
mod checkout_api;
mod sqlite;

pub mod db_types;
pub mod helpers;
pub mod offers;
pub mod processors;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use checkout_api::{
    accounts_api::AccountApi,
    checkout_flow_api::{CheckoutFlowApi, FreeCheckoutResult},
    errors::{CheckoutError, SubmissionError},
    payment_api::PaymentApi,
    payment_objects,
};
pub use sqlite::{db, SqliteDatabase};
