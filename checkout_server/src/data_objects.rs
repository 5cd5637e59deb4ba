use std::collections::BTreeMap;

use checkout_engine::{
    db_types::{Order, ProcessorFields},
    payment_objects::FieldErrors,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptQuery {
    pub order_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptResponse {
    pub order: Order,
    pub name: String,
    /// e.g. "Visa xxxxxxxxxxxx1111". Free orders have no payment method.
    pub payment_method: Option<String>,
    pub providers: BTreeMap<String, Value>,
    pub verified_course_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptNotFound {
    pub order_history_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportDetails {
    pub payment_support_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentFormFields {
    pub form_fields: ProcessorFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentFormErrors {
    pub field_errors: FieldErrors,
}
