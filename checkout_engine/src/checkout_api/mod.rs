//! # Checkout engine public API
//!
//! The pattern for using the APIs is the same throughout. An API instance is created by supplying a database backend
//! that implements the backend traits the API needs, plus whatever else it needs (site configuration, a payment
//! processor).
//!
//! * [`accounts_api`] looks up user accounts.
//! * [`checkout_flow_api`] handles free checkout and receipt lookups.
//! * [`payment_api`] handles payment form submission and payment notifications.
//!
//! ```rust,ignore
//! use checkout_engine::{processors::Cybersource, PaymentApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = PaymentApi::new(db, Cybersource::new(config, site.clone()), site);
//! let outcome = api.handle_notification(fields).await;
//! ```
pub mod accounts_api;
pub mod checkout_flow_api;
pub mod errors;
pub mod payment_api;
pub mod payment_objects;
