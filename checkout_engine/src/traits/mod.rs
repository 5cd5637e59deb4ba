//! # Backend contracts
//!
//! The traits in this module define what a storage backend must provide in order to drive the checkout engine.
//! Each trait carries its own error type, and each error type separates "the thing you asked for does not exist" from
//! "the backend failed". Callers rely on that split: a missing basket is a client error, while a failed query is a
//! transient error that the payment gateway should retry.
//!
//! * [`AccountManagement`] looks up the users that own baskets and orders.
//! * [`BasketManagement`] reads baskets and vouchers and moves baskets through their lifecycle.
//! * [`OrderManagement`] places orders atomically and fetches them for receipts.
//! * [`PaymentRecords`] is the append-only audit trail of gateway notifications and SDN check failures.
//! * [`CheckoutDatabase`] bundles all of the above.
mod account_management;
mod basket_management;
mod checkout_database;
mod order_management;
mod payment_records;

pub use account_management::{AccountError, AccountManagement};
pub use basket_management::{BasketError, BasketManagement};
pub use checkout_database::CheckoutDatabase;
pub use order_management::{OrderError, OrderManagement};
pub use payment_records::{PaymentRecords, RecordError};
