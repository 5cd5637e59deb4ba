mod order_number;
mod site;

pub use order_number::{OrderNumberGenerator, ORDER_NUMBER_OFFSET};
pub use site::{get_lms_url, get_receipt_page_url, SiteConfig};
