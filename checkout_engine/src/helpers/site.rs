use url::{ParseError, Url};

pub const DEFAULT_BASKET_SUMMARY_PATH: &str = "/basket/";
pub const DEFAULT_CANCEL_CHECKOUT_PATH: &str = "/checkout/cancel-checkout/";

/// Per-site settings that shape URLs and switch optional behaviour on or off.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// The site identifier that baskets and orders are tagged with
    pub site: String,
    /// Order number prefix, e.g. "EDX"
    pub partner_short_code: String,
    pub lms_url_root: Url,
    pub ecommerce_url_root: Url,
    /// When set, receipts are served by this service rather than the LMS.
    pub enable_otto_receipt_page: bool,
    pub enable_sdn_check: bool,
    pub payment_support_email: String,
    pub basket_summary_path: String,
    pub cancel_checkout_path: String,
}

impl SiteConfig {
    pub fn new(
        site: &str,
        partner_short_code: &str,
        lms_url_root: &str,
        ecommerce_url_root: &str,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            site: site.to_string(),
            partner_short_code: partner_short_code.to_string(),
            lms_url_root: Url::parse(lms_url_root)?,
            ecommerce_url_root: Url::parse(ecommerce_url_root)?,
            enable_otto_receipt_page: false,
            enable_sdn_check: false,
            payment_support_email: String::default(),
            basket_summary_path: DEFAULT_BASKET_SUMMARY_PATH.to_string(),
            cancel_checkout_path: DEFAULT_CANCEL_CHECKOUT_PATH.to_string(),
        })
    }

    /// Resolves `path` against the LMS root. Absolute URLs are returned unchanged.
    pub fn build_lms_url(&self, path: &str) -> Result<Url, ParseError> {
        self.lms_url_root.join(path)
    }

    /// Resolves `path` against this service's public root. Absolute URLs are returned unchanged.
    pub fn build_ecommerce_url(&self, path: &str) -> Result<Url, ParseError> {
        self.ecommerce_url_root.join(path)
    }
}

/// Returns the URL of the page that shows the receipt for `order_number`.
///
/// Depending on the site configuration, this is either this service's own receipt page or the LMS receipt page. The
/// query string is omitted when there is no order number.
pub fn get_receipt_page_url(site: &SiteConfig, order_number: Option<&str>) -> Result<String, ParseError> {
    let (mut url, key) = if site.enable_otto_receipt_page {
        (site.build_ecommerce_url("/checkout/receipt/")?, "order_number")
    } else {
        (site.build_lms_url("/commerce/checkout/receipt")?, "orderNum")
    };
    if let Some(number) = order_number {
        url.query_pairs_mut().append_pair(key, number);
    }
    Ok(url.to_string())
}

/// Resolves `path` against the LMS root, leaving absolute URLs untouched.
pub fn get_lms_url(site: &SiteConfig, path: &str) -> Result<String, ParseError> {
    site.build_lms_url(path).map(|u| u.to_string())
}
