use std::fmt::Debug;

use log::*;
use serde_json::Value;

use crate::{
    checkout_api::{
        errors::SubmissionError,
        payment_objects::{BillingDetails, NotificationOutcome},
    },
    db_types::{
        Basket,
        BasketStatus,
        NewOrder,
        NewProcessorResponse,
        OrderNumber,
        PaymentSource,
        ProcessorFields,
        ShippingMethod,
        UserAccount,
    },
    helpers::{OrderNumberGenerator, SiteConfig},
    offers::apply_offers,
    processors::{PaymentError, PaymentProcessor, PCI_FIELDS},
    traits::{BasketError, CheckoutDatabase, OrderError},
};

/// `PaymentApi` drives both halves of a hosted-payment-page checkout: preparing the signed payment form for a basket,
/// and turning the gateway's notification into an order.
pub struct PaymentApi<B, P> {
    db: B,
    processor: P,
    site: SiteConfig,
    numbers: OrderNumberGenerator,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi ({})", self.site.site)
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: CheckoutDatabase,
    P: PaymentProcessor,
{
    pub fn new(db: B, processor: P, site: SiteConfig) -> Self {
        let numbers = OrderNumberGenerator::new(site.partner_short_code.as_str());
        Self { db, processor, site, numbers }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Fetches the basket a payment form refers to. The basket must belong to `user` and must still be open.
    pub async fn fetch_basket_for_submission(
        &self,
        user: &UserAccount,
        basket_id: i64,
    ) -> Result<Basket, SubmissionError> {
        let basket = self
            .db
            .fetch_basket(basket_id)
            .await?
            .filter(|b| b.owner_id == user.id && b.site == self.site.site)
            .ok_or(SubmissionError::BasketNotFound(basket_id))?;
        if basket.status != BasketStatus::Open {
            return Err(SubmissionError::BasketNotOpen { id: basket.id, status: basket.status });
        }
        Ok(basket)
    }

    /// Produces the signed fields the browser posts to the gateway, then freezes the basket.
    ///
    /// The parameters are generated before the basket is frozen, so a failure here leaves the basket open for
    /// another attempt. The gateway URL is left out; the client already knows where to post.
    pub async fn submit_payment(
        &self,
        user: &UserAccount,
        mut basket: Basket,
        billing: &BillingDetails,
        session_id: Option<&str>,
    ) -> Result<ProcessorFields, SubmissionError> {
        apply_offers(&self.db, &mut basket).await?;
        let order_number = self.numbers.order_number(basket.id);
        let mut extra = billing.processor_fields();
        extra.insert("payment_method".into(), "card".into());
        extra.insert("unsigned_field_names".into(), PCI_FIELDS.join(","));
        extra.insert("bill_to_email".into(), user.email.clone());
        if let Some(session_id) = session_id {
            extra.insert("device_fingerprint_id".into(), session_id.to_string());
        }
        let mut params = self.processor.get_transaction_parameters(&basket, &order_number, user, true, extra)?;
        params.remove("payment_page_url");
        self.db.freeze_basket(basket.id).await?;
        info!("💳️ Basket #{} frozen. Payment form issued for order [{order_number}] ({})", basket.id, basket.total());
        Ok(params)
    }

    /// Handles a payment notification posted by the gateway.
    ///
    /// The notification is always written to the audit log first, whatever happens next. Only then is the basket
    /// checked, the payment validated and, for a fully authorised payment, the order placed. See
    /// [`NotificationOutcome::disposition`] for how each outcome should be reported back to the gateway.
    pub async fn handle_notification(&self, fields: ProcessorFields) -> NotificationOutcome {
        let transaction_id = self.processor.transaction_id(&fields).map(String::from);
        let order_number = self.processor.order_number(&fields).map(String::from);
        let lookup = self.resolve_basket(order_number.as_deref()).await;
        let basket_id = match &lookup {
            Ok(Some(basket)) => Some(basket.id),
            _ => None,
        };

        let record = NewProcessorResponse {
            processor_name: self.processor.name().to_string(),
            transaction_id: transaction_id.clone(),
            basket_id,
            response: Value::Object(fields.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()),
        };
        let record = match self.db.record_processor_response(record).await {
            Ok(record) => record,
            Err(e) => {
                error!(
                    "🧾️ Could not record the payment notification for transaction {transaction_id:?}, basket \
                     {basket_id:?}. {e}"
                );
                return NotificationOutcome::RecordFailed(e.to_string());
            },
        };
        let context = format!("[transaction {transaction_id:?}, record #{}]", record.id);

        let mut basket = match lookup {
            Ok(Some(basket)) => basket,
            Ok(None) => {
                error!("🧾️ Received payment for non-existent basket {order_number:?} {context}");
                return NotificationOutcome::UnknownBasket(order_number);
            },
            Err(e) => {
                error!("🧾️ Could not load the basket for order {order_number:?} {context}. {e}");
                return NotificationOutcome::BasketLookupFailed(e.to_string());
            },
        };
        let context = format!("[basket #{}, transaction {transaction_id:?}, record #{}]", basket.id, record.id);

        let handled = match self.processor.handle_processor_response(&fields) {
            Ok(handled) => handled,
            Err(e @ PaymentError::InvalidSignature(_)) => {
                error!("🧾️ Payment notification rejected {context}. {e}");
                return NotificationOutcome::InvalidSignature(e);
            },
            Err(e) if e.is_customer_outcome() => {
                info!("🧾️ Payment not completed {context}. {e}");
                return NotificationOutcome::PaymentNotCompleted(e);
            },
            Err(e) if e.is_gateway_outcome() => {
                error!("🧾️ Payment failed {context}. {e}");
                return NotificationOutcome::PaymentFailed(e);
            },
            Err(e) => {
                error!("🧾️ Attempts to handle payment failed {context}. {e}");
                return NotificationOutcome::HandlingFailed(e.to_string());
            },
        };

        let billing_address = match self.processor.billing_address(&fields) {
            Ok(address) => address,
            Err(e) => {
                error!("🧾️ Could not build the billing address {context}. {e}");
                return NotificationOutcome::OrderPlacementFailed(e.to_string());
            },
        };
        let shipping_method = ShippingMethod::NoShippingRequired;
        let shipping_charge = shipping_method.calculate(&basket);
        let total = basket.total() + shipping_charge;
        if total != handled.total {
            warn!("🧾️ The gateway charged {} but the basket total is {total} {context}", handled.total);
        }
        let number = order_number.map(OrderNumber).unwrap_or_else(|| self.numbers.order_number(basket.id));
        let order = NewOrder {
            number,
            basket_id: basket.id,
            user_id: basket.owner_id,
            site: basket.site.clone(),
            currency: basket.currency.clone(),
            total,
            shipping_method,
            shipping_charge,
            billing_address: Some(billing_address),
            payment_source: Some(PaymentSource {
                card_type: handled.card_type.unwrap_or_default(),
                label: handled.card_number,
            }),
            lines: std::mem::take(&mut basket.lines),
        };
        match self.db.place_order(order).await {
            Ok(order) => {
                info!("🧾️ Order [{}] placed {context}", order.number);
                NotificationOutcome::OrderPlaced(order)
            },
            Err(OrderError::OrderAlreadyExists(number)) => {
                info!("🧾️ Order [{number}] was already placed. Duplicate notification acknowledged {context}");
                NotificationOutcome::AlreadyPlaced(number)
            },
            Err(e) => {
                error!("🧾️ Order placement failed {context}. {e}");
                NotificationOutcome::OrderPlacementFailed(e.to_string())
            },
        }
    }

    /// Finds the basket an order number refers to and re-applies its offers. A missing or malformed order number, or
    /// one that refers to a basket that does not exist, resolves to `None`.
    async fn resolve_basket(&self, order_number: Option<&str>) -> Result<Option<Basket>, BasketError> {
        let Some(basket_id) = order_number.and_then(|n| self.numbers.basket_id(n)) else {
            return Ok(None);
        };
        let Some(mut basket) = self.db.fetch_basket(basket_id).await? else {
            return Ok(None);
        };
        apply_offers(&self.db, &mut basket).await?;
        Ok(Some(basket))
    }
}
