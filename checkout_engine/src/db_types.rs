use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use checkout_common::Money;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUserAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

//--------------------------------------    BasketStatus       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum BasketStatus {
    /// The basket can still be modified by its owner.
    Open,
    /// The basket has been merged into another basket and is no longer in use.
    Merged,
    /// Payment has started. The basket contents are locked.
    Frozen,
    /// An order has been placed for this basket.
    Submitted,
}

impl BasketStatus {
    /// Baskets only ever move forward: Open → Frozen → Submitted. Open baskets may also be submitted directly (free
    /// checkout) or merged.
    pub fn can_transition_to(&self, next: BasketStatus) -> bool {
        use BasketStatus::*;
        matches!((self, next), (Open, Frozen) | (Open, Merged) | (Open, Submitted) | (Frozen, Submitted))
    }
}

impl Display for BasketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasketStatus::Open => write!(f, "Open"),
            BasketStatus::Merged => write!(f, "Merged"),
            BasketStatus::Frozen => write!(f, "Frozen"),
            BasketStatus::Submitted => write!(f, "Submitted"),
        }
    }
}

impl FromStr for BasketStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Merged" => Ok(Self::Merged),
            "Frozen" => Ok(Self::Frozen),
            "Submitted" => Ok(Self::Submitted),
            s => Err(ConversionError(format!("Invalid basket status: {s}"))),
        }
    }
}

impl From<String> for BasketStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid basket status: {value}. But this conversion cannot fail. Defaulting to Frozen");
            BasketStatus::Frozen
        })
    }
}

//--------------------------------------        Basket         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Basket {
    pub id: i64,
    pub owner_id: i64,
    pub site: String,
    pub status: BasketStatus,
    pub voucher_code: Option<String>,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub lines: Vec<BasketLine>,
}

impl Basket {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_before_discounts(&self) -> Money {
        self.lines.iter().map(BasketLine::price_before_discount).sum()
    }

    pub fn total_discount(&self) -> Money {
        self.lines.iter().map(|l| l.discount).sum()
    }

    /// The amount the customer must pay for the basket contents, after discounts.
    pub fn total(&self) -> Money {
        self.lines.iter().map(BasketLine::line_price).sum()
    }
}

#[derive(Debug, Clone)]
pub struct NewBasket {
    pub owner_id: i64,
    pub site: String,
    pub currency: String,
    pub voucher_code: Option<String>,
    pub lines: Vec<NewBasketLine>,
}

impl NewBasket {
    pub fn new<S: Into<String>>(owner_id: i64, site: S) -> Self {
        Self {
            owner_id,
            site: site.into(),
            currency: checkout_common::DEFAULT_CURRENCY.to_string(),
            voucher_code: None,
            lines: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: NewBasketLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn with_voucher<S: Into<String>>(mut self, code: S) -> Self {
        self.voucher_code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BasketLine {
    pub id: i64,
    pub basket_id: i64,
    pub product_id: String,
    pub title: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Set by the offer applicator. It is never persisted, since offers are re-applied whenever a basket is loaded.
    #[sqlx(default)]
    pub discount: Money,
    pub credit_provider: Option<String>,
    pub course_key: Option<String>,
    pub id_verification_required: bool,
}

impl BasketLine {
    pub fn price_before_discount(&self) -> Money {
        self.unit_price * self.quantity
    }

    pub fn line_price(&self) -> Money {
        self.price_before_discount() - self.discount
    }
}

#[derive(Debug, Clone)]
pub struct NewBasketLine {
    pub product_id: String,
    pub title: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub credit_provider: Option<String>,
    pub course_key: Option<String>,
    pub id_verification_required: bool,
}

impl NewBasketLine {
    pub fn new<S: Into<String>>(product_id: S, title: S, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            title: title.into(),
            quantity: 1,
            unit_price,
            credit_provider: None,
            course_key: None,
            id_verification_required: false,
        }
    }

    pub fn with_credit_provider<S: Into<String>>(mut self, provider: S) -> Self {
        self.credit_provider = Some(provider.into());
        self
    }

    pub fn with_course_key<S: Into<String>>(mut self, course_key: S) -> Self {
        self.course_key = Some(course_key.into());
        self
    }

    pub fn with_id_verification(mut self) -> Self {
        self.id_verification_required = true;
        self
    }
}

//--------------------------------------        Voucher        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Voucher {
    pub code: String,
    /// Percentage discount applied to every line of a basket, 0 – 100.
    pub percent_off: i64,
}

//--------------------------------------      OrderNumber      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    ShippingMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ShippingMethod {
    /// Digital goods. Nothing is shipped and nothing is charged.
    #[default]
    NoShippingRequired,
}

impl ShippingMethod {
    pub fn calculate(&self, _basket: &Basket) -> Money {
        match self {
            ShippingMethod::NoShippingRequired => Money::from(0),
        }
    }
}

impl Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShippingMethod::NoShippingRequired => write!(f, "NoShippingRequired"),
        }
    }
}

impl From<String> for ShippingMethod {
    fn from(value: String) -> Self {
        if value != "NoShippingRequired" {
            error!("Unknown shipping method: {value}. Defaulting to NoShippingRequired");
        }
        ShippingMethod::NoShippingRequired
    }
}

//--------------------------------------    BillingAddress     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAddress {
    pub first_name: String,
    pub last_name: String,
    pub line1: String,
    pub line2: String,
    /// The city
    pub line4: String,
    pub postcode: String,
    pub state: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
}

//--------------------------------------     PaymentSource     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSource {
    /// Human-readable card brand, e.g. "Visa"
    pub card_type: String,
    /// Masked card number, e.g. "xxxxxxxxxxxx1111"
    pub label: String,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub basket_id: i64,
    pub user_id: i64,
    pub site: String,
    pub currency: String,
    pub total: Money,
    pub shipping_method: ShippingMethod,
    pub shipping_charge: Money,
    pub billing_address: Option<BillingAddress>,
    pub payment_source: Option<PaymentSource>,
    pub lines: Vec<BasketLine>,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub basket_id: i64,
    pub user_id: i64,
    pub site: String,
    pub currency: String,
    pub total: Money,
    pub shipping_method: ShippingMethod,
    pub shipping_charge: Money,
    pub billing_address: Option<Json<BillingAddress>>,
    pub card_type: Option<String>,
    pub card_label: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub lines: Vec<OrderLine>,
}

impl Order {
    pub fn payment_source(&self) -> Option<PaymentSource> {
        match (&self.card_type, &self.card_label) {
            (Some(card_type), Some(label)) => Some(PaymentSource { card_type: card_type.clone(), label: label.clone() }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: String,
    pub title: String,
    pub quantity: i64,
    pub line_price: Money,
    pub credit_provider: Option<String>,
    pub course_key: Option<String>,
    pub id_verification_required: bool,
}

//-------------------------------------- PaymentProcessorResponse ------------------------------------------------------
/// Raw gateway fields. A sorted map keeps stored records stable.
pub type ProcessorFields = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct NewProcessorResponse {
    pub processor_name: String,
    pub transaction_id: Option<String>,
    pub basket_id: Option<i64>,
    pub response: Value,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProcessorResponse {
    pub id: i64,
    pub processor_name: String,
    pub transaction_id: Option<String>,
    pub basket_id: Option<i64>,
    pub response: Json<Value>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    SdnCheckFailure    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSdnCheckFailure {
    pub full_name: String,
    pub username: Option<String>,
    pub sdn_check_response: String,
    pub basket_id: Option<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SdnCheckFailure {
    pub id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub sdn_check_response: String,
    pub basket_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
