mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{add_currency, Money, MoneyConversionError, DEFAULT_CURRENCY};
pub use secret::Secret;
