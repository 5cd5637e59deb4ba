//! Offer application.
//!
//! Discounts are never stored on basket lines. They are recalculated from the basket's voucher every time a basket is
//! about to be priced, which keeps the submitted amount, the notification check and the placed order in agreement.
use log::*;

use crate::{
    db_types::{Basket, Money, Voucher},
    traits::{BasketError, BasketManagement},
};

/// Clears any existing line discounts on `basket` and re-applies the basket's voucher, if it has one.
///
/// A voucher code that no longer resolves is logged and ignored, leaving the basket at full price.
pub async fn apply_offers<B: BasketManagement>(db: &B, basket: &mut Basket) -> Result<(), BasketError> {
    clear_discounts(basket);
    let Some(code) = basket.voucher_code.clone() else {
        return Ok(());
    };
    match db.fetch_voucher(&code).await? {
        Some(voucher) => {
            apply_voucher(basket, &voucher);
            debug!("🏷️ Voucher {code} applied to basket #{}. Discount: {}", basket.id, basket.total_discount());
        },
        None => warn!("🏷️ Basket #{} refers to voucher {code}, which does not exist. No discount applied.", basket.id),
    }
    Ok(())
}

fn clear_discounts(basket: &mut Basket) {
    basket.lines.iter_mut().for_each(|line| line.discount = Money::default());
}

/// Discounts every line by the voucher's percentage, rounding the discount down to the nearest cent.
pub fn apply_voucher(basket: &mut Basket, voucher: &Voucher) {
    let percent = voucher.percent_off.clamp(0, 100);
    for line in basket.lines.iter_mut() {
        let price = line.price_before_discount().value();
        line.discount = Money::from(price * percent / 100);
    }
}
