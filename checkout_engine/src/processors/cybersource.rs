//! CyberSource Secure Acceptance.
//!
//! Both directions of the exchange are signed with the same shared secret: the parameters we hand to the browser, and
//! the notification CyberSource posts back. The signature is `base64(HMAC-SHA256(secret, message))`, where `message`
//! is `name=value` pairs joined with commas, for every field named in `signed_field_names`, in that order.
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use checkout_common::Secret;
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    db_types::{Basket, BillingAddress, Money, OrderNumber, ProcessorFields, UserAccount},
    helpers::{get_receipt_page_url, SiteConfig},
    processors::{HandledProcessorResponse, PaymentError, PaymentProcessor},
};

type HmacSha256 = Hmac<Sha256>;

pub const PROCESSOR_NAME: &str = "cybersource";

/// Card data fields. These must never be signed, since that would mean they passed through this server.
pub const PCI_FIELDS: [&str; 4] = ["card_cvn", "card_expiry_date", "card_number", "card_type"];

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Maps CyberSource card type codes to card brand names.
pub fn card_type_name(code: &str) -> Option<&'static str> {
    match code {
        "001" => Some("Visa"),
        "002" => Some("MasterCard"),
        "003" => Some("American Express"),
        "004" => Some("Discover"),
        "005" => Some("Diners Club"),
        "007" => Some("JCB"),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct CybersourceConfig {
    pub profile_id: String,
    pub access_key: String,
    pub secret_key: Secret<String>,
    /// Hosted payment page
    pub payment_page_url: String,
    /// Silent order POST endpoint
    pub sop_payment_page_url: String,
    pub language_code: String,
}

#[derive(Debug, Clone)]
pub struct Cybersource {
    config: CybersourceConfig,
    site: SiteConfig,
}

impl Cybersource {
    pub fn new(config: CybersourceConfig, site: SiteConfig) -> Self {
        Self { config, site }
    }

    fn mac(&self) -> Result<HmacSha256, PaymentError> {
        HmacSha256::new_from_slice(self.config.secret_key.reveal().as_bytes())
            .map_err(|e| PaymentError::Configuration(e.to_string()))
    }

    /// Builds the message that gets signed. Every field named in `signed_field_names` must be present.
    fn signing_message(fields: &ProcessorFields) -> Result<String, String> {
        let names = fields.get("signed_field_names").ok_or("signed_field_names is missing")?;
        let pairs = names
            .split(',')
            .map(|name| match fields.get(name) {
                Some(value) => Ok(format!("{name}={value}")),
                None => Err(format!("signed field {name} is missing")),
            })
            .collect::<Result<Vec<String>, String>>()?;
        Ok(pairs.join(","))
    }

    pub fn generate_signature(&self, fields: &ProcessorFields) -> Result<String, PaymentError> {
        let message = Self::signing_message(fields).map_err(PaymentError::Configuration)?;
        let mut mac = self.mac()?;
        mac.update(message.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    pub fn verify_signature(&self, fields: &ProcessorFields) -> Result<(), PaymentError> {
        let signature = fields.get("signature").ok_or_else(|| invalid("signature is missing"))?;
        let signature = BASE64.decode(signature).map_err(|e| invalid(&e.to_string()))?;
        let message = Self::signing_message(fields).map_err(|e| invalid(&e))?;
        let mut mac = self.mac()?;
        mac.update(message.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid("signature does not match"))
    }
}

fn invalid(reason: &str) -> PaymentError {
    PaymentError::InvalidSignature(reason.to_string())
}

fn required<'a>(fields: &'a ProcessorFields, name: &str) -> Result<&'a str, PaymentError> {
    fields.get(name).map(String::as_str).ok_or_else(|| PaymentError::MalformedResponse(format!("{name} is missing")))
}

fn optional(fields: &ProcessorFields, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

fn amount(fields: &ProcessorFields, name: &str) -> Result<Money, PaymentError> {
    required(fields, name)?.parse::<Money>().map_err(|e| PaymentError::MalformedResponse(format!("{name}: {e}")))
}

impl PaymentProcessor for Cybersource {
    fn name(&self) -> &str {
        PROCESSOR_NAME
    }

    fn get_transaction_parameters(
        &self,
        basket: &Basket,
        order_number: &OrderNumber,
        user: &UserAccount,
        use_client_side_checkout: bool,
        extra: ProcessorFields,
    ) -> Result<ProcessorFields, PaymentError> {
        let receipt_page = get_receipt_page_url(&self.site, Some(order_number.as_str()))
            .map_err(|e| PaymentError::Configuration(e.to_string()))?;
        let cancel_page = self
            .site
            .build_ecommerce_url(&self.site.cancel_checkout_path)
            .map_err(|e| PaymentError::Configuration(e.to_string()))?;
        let mut params = ProcessorFields::new();
        params.insert("access_key".into(), self.config.access_key.clone());
        params.insert("profile_id".into(), self.config.profile_id.clone());
        params.insert("transaction_uuid".into(), Uuid::new_v4().simple().to_string());
        params.insert("signed_field_names".into(), String::default());
        params.insert("unsigned_field_names".into(), String::default());
        params.insert("signed_date_time".into(), Utc::now().format(DATE_FORMAT).to_string());
        params.insert("locale".into(), self.config.language_code.clone());
        params.insert("transaction_type".into(), "sale".into());
        params.insert("reference_number".into(), order_number.to_string());
        params.insert("amount".into(), basket.total().to_string());
        params.insert("currency".into(), basket.currency.clone());
        params.insert("consumer_id".into(), user.username.clone());
        params.insert("override_custom_receipt_page".into(), receipt_page);
        params.insert("override_custom_cancel_page".into(), cancel_page.to_string());
        if let Some(course_key) = basket.lines.iter().find_map(|l| l.course_key.clone()) {
            params.insert("merchant_defined_data1".into(), course_key);
        }
        params.extend(extra);

        if let Some(field) = PCI_FIELDS.iter().find(|f| params.contains_key(**f)) {
            return Err(PaymentError::PciViolation(format!("{field} was included in the signed fields")));
        }
        let signed = params.keys().cloned().collect::<Vec<String>>().join(",");
        params.insert("signed_field_names".into(), signed);
        let signature = self.generate_signature(&params)?;
        params.insert("signature".into(), signature);

        let page = match use_client_side_checkout {
            true => &self.config.sop_payment_page_url,
            false => &self.config.payment_page_url,
        };
        params.insert("payment_page_url".into(), page.clone());
        trace!("💳️ Transaction parameters generated for {order_number}");
        Ok(params)
    }

    fn handle_processor_response(&self, response: &ProcessorFields) -> Result<HandledProcessorResponse, PaymentError> {
        self.verify_signature(response)?;
        let decision = required(response, "decision")?.to_lowercase();
        match decision.as_str() {
            "accept" => {},
            "cancel" => return Err(PaymentError::UserCancelled),
            "decline" => return Err(PaymentError::TransactionDeclined),
            "error" => return Err(PaymentError::GatewayError),
            other => return Err(PaymentError::UnknownDecision(other.to_string())),
        }
        let requested = amount(response, "req_amount")?;
        let authorized = amount(response, "auth_amount")?;
        if requested != authorized {
            return Err(PaymentError::PartialAuthorization { requested, authorized });
        }
        let card_type = card_type_name(&optional(response, "req_card_type")).map(String::from);
        if card_type.is_none() {
            warn!("💳️ Unknown card type code {:?}", response.get("req_card_type"));
        }
        Ok(HandledProcessorResponse {
            transaction_id: required(response, "transaction_id")?.to_string(),
            total: requested,
            currency: required(response, "req_currency")?.to_string(),
            card_number: optional(response, "req_card_number"),
            card_type,
        })
    }

    fn billing_address(&self, response: &ProcessorFields) -> Result<BillingAddress, PaymentError> {
        Ok(BillingAddress {
            first_name: required(response, "req_bill_to_forename")?.to_string(),
            last_name: required(response, "req_bill_to_surname")?.to_string(),
            line1: required(response, "req_bill_to_address_line1")?.to_string(),
            line2: optional(response, "req_bill_to_address_line2"),
            line4: required(response, "req_bill_to_address_city")?.to_string(),
            postcode: optional(response, "req_bill_to_address_postal_code"),
            state: optional(response, "req_bill_to_address_state"),
            country: required(response, "req_bill_to_address_country")?.to_string(),
        })
    }

    fn transaction_id<'a>(&self, response: &'a ProcessorFields) -> Option<&'a str> {
        response.get("transaction_id").map(String::as_str)
    }

    fn order_number<'a>(&self, response: &'a ProcessorFields) -> Option<&'a str> {
        response.get("req_reference_number").map(String::as_str)
    }
}
