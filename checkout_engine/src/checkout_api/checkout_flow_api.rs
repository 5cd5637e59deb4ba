use std::fmt::Debug;

use log::*;

use crate::{
    checkout_api::errors::CheckoutError,
    db_types::{NewOrder, Order, OrderNumber, ShippingMethod, UserAccount},
    helpers::{OrderNumberGenerator, SiteConfig},
    offers::apply_offers,
    traits::{BasketManagement, OrderManagement},
};

#[derive(Debug, Clone)]
pub enum FreeCheckoutResult {
    /// There is nothing to check out. The user belongs back on the basket page.
    EmptyBasket,
    OrderPlaced(Order),
}

/// Checkout steps that do not involve a payment processor: free orders and receipts.
pub struct CheckoutFlowApi<B> {
    db: B,
    site: SiteConfig,
    numbers: OrderNumberGenerator,
}

impl<B> Debug for CheckoutFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutFlowApi ({})", self.site.site)
    }
}

impl<B> CheckoutFlowApi<B>
where B: BasketManagement + OrderManagement
{
    pub fn new(db: B, site: SiteConfig) -> Self {
        let numbers = OrderNumberGenerator::new(site.partner_short_code.as_str());
        Self { db, site, numbers }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Places an order for the user's open basket, provided it costs nothing once offers are applied.
    pub async fn free_checkout(&self, user: &UserAccount) -> Result<FreeCheckoutResult, CheckoutError> {
        let Some(mut basket) = self.db.fetch_open_basket_for_user(user.id, &self.site.site).await? else {
            debug!("🆓️ User #{} has no open basket", user.id);
            return Ok(FreeCheckoutResult::EmptyBasket);
        };
        if basket.is_empty() {
            debug!("🆓️ Basket #{} is empty", basket.id);
            return Ok(FreeCheckoutResult::EmptyBasket);
        }
        apply_offers(&self.db, &mut basket).await?;
        let total = basket.total();
        if !total.is_zero() {
            warn!("🆓️ Free checkout attempted for basket #{} with a total of {total}", basket.id);
            return Err(CheckoutError::BasketNotFree(total));
        }
        let shipping_method = ShippingMethod::NoShippingRequired;
        let order = NewOrder {
            number: self.numbers.order_number(basket.id),
            basket_id: basket.id,
            user_id: user.id,
            site: basket.site.clone(),
            currency: basket.currency.clone(),
            total,
            shipping_method,
            shipping_charge: shipping_method.calculate(&basket),
            billing_address: None,
            payment_source: None,
            lines: basket.lines,
        };
        let order = self.db.place_order(order).await?;
        info!("🆓️ Free order [{}] placed for user #{}", order.number, user.id);
        Ok(FreeCheckoutResult::OrderPlaced(order))
    }

    /// Fetches an order for display on the receipt page. Staff can see any order on the site. Everyone else can only
    /// see their own.
    pub async fn receipt_order(&self, user: &UserAccount, number: &OrderNumber) -> Result<Option<Order>, CheckoutError> {
        let order = self.db.fetch_order_by_number(number).await?;
        let visible = order.filter(|o| o.site == self.site.site && (user.is_staff || o.user_id == user.id));
        if visible.is_none() {
            debug!("🧾️ Order [{number}] is not visible to user #{}", user.id);
        }
        Ok(visible)
    }
}
