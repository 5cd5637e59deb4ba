use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderNumber, ProcessorFields},
    processors::PaymentError,
};

pub const FIELD_REQUIRED: &str = "This field is required.";

/// Validation messages, keyed by form field name.
pub type FieldErrors = BTreeMap<String, String>;

/// The payment form as posted by the browser. Everything is optional here; [`PaymentForm::validate`] decides what is
/// actually required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentForm {
    pub basket: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Billing details that have passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BillingDetails {
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2, upper case
    pub country: String,
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

impl PaymentForm {
    /// Validates the form, returning the basket id and billing details, or every field error found.
    pub fn validate(self) -> Result<(i64, BillingDetails), FieldErrors> {
        let mut errors = FieldErrors::new();
        let basket = clean(self.basket);
        let details = BillingDetails {
            first_name: clean(self.first_name),
            last_name: clean(self.last_name),
            address_line1: clean(self.address_line1),
            address_line2: clean(self.address_line2),
            city: clean(self.city),
            state: clean(self.state),
            postal_code: clean(self.postal_code),
            country: clean(self.country).to_uppercase(),
        };
        let required = [
            ("basket", &basket),
            ("first_name", &details.first_name),
            ("last_name", &details.last_name),
            ("address_line1", &details.address_line1),
            ("city", &details.city),
            ("country", &details.country),
        ];
        for (field, value) in required {
            if value.is_empty() {
                errors.insert(field.to_string(), FIELD_REQUIRED.to_string());
            }
        }
        let country = details.country.as_str();
        if !country.is_empty() && (country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic())) {
            errors.insert(
                "country".to_string(),
                format!("Select a valid choice. {country} is not one of the available choices."),
            );
        }
        if matches!(country, "US" | "CA") && details.state.is_empty() {
            errors.insert("state".to_string(), FIELD_REQUIRED.to_string());
        }
        let basket_id = match basket.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) if basket.is_empty() => None,
            Err(_) => {
                errors.insert("basket".to_string(), "Select a valid choice.".to_string());
                None
            },
        };
        match basket_id {
            Some(id) if errors.is_empty() => Ok((id, details)),
            _ => Err(errors),
        }
    }
}

impl BillingDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// All address parts, space separated, with empty parts left out.
    pub fn full_address(&self) -> String {
        [
            &self.address_line1,
            &self.address_line2,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
    }

    /// The billing fields, under the names the payment gateway uses for them.
    pub fn processor_fields(&self) -> ProcessorFields {
        [
            ("bill_to_address_city", &self.city),
            ("bill_to_address_country", &self.country),
            ("bill_to_address_line1", &self.address_line1),
            ("bill_to_address_line2", &self.address_line2),
            ("bill_to_address_postal_code", &self.postal_code),
            ("bill_to_address_state", &self.state),
            ("bill_to_forename", &self.first_name),
            ("bill_to_surname", &self.last_name),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

/// How the payment gateway should treat a notification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The notification was dealt with. The gateway must not resend it.
    Acknowledge,
    /// The notification can never succeed. The gateway must not resend it.
    Reject,
    /// Something transient went wrong. The gateway should resend the notification later.
    Retry,
}

/// Everything that can come of a payment notification.
#[derive(Debug, Clone)]
pub enum NotificationOutcome {
    OrderPlaced(Order),
    /// The order for this basket was placed by an earlier delivery of the same notification.
    AlreadyPlaced(OrderNumber),
    /// The customer cancelled, or the card was declined.
    PaymentNotCompleted(PaymentError),
    /// The gateway reported a problem with the payment itself.
    PaymentFailed(PaymentError),
    InvalidSignature(PaymentError),
    /// The reference number did not lead to a basket.
    UnknownBasket(Option<String>),
    BasketLookupFailed(String),
    RecordFailed(String),
    HandlingFailed(String),
    OrderPlacementFailed(String),
}

impl NotificationOutcome {
    pub fn disposition(&self) -> Disposition {
        use NotificationOutcome::*;
        match self {
            OrderPlaced(_) | AlreadyPlaced(_) | PaymentNotCompleted(_) | PaymentFailed(_) => Disposition::Acknowledge,
            InvalidSignature(_) | UnknownBasket(_) => Disposition::Reject,
            BasketLookupFailed(_) | RecordFailed(_) | HandlingFailed(_) | OrderPlacementFailed(_) => Disposition::Retry,
        }
    }
}
