//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//! The payment gateway handlers live in [`crate::payment_routes`].
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O (database queries, calls to the LMS or the SDN API) must be
//! awaited, never blocked on.
use actix_web::{get, http::header, route, web, HttpResponse, Responder};
use checkout_engine::{
    db_types::{Order, OrderNumber},
    helpers::{get_lms_url, get_receipt_page_url, SiteConfig},
    traits::CheckoutDatabase,
    AccountApi,
    CheckoutFlowApi,
    FreeCheckoutResult,
};
use log::*;

use crate::{
    auth::{current_user, JwtClaims},
    data_objects::{ReceiptNotFound, ReceiptQuery, ReceiptResponse, SupportDetails},
    errors::ServerError,
    integrations::CreditProviders,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:tt impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().insert_header((header::LOCATION, location)).finish()
}

fn url_error<E: std::fmt::Display>(e: E) -> ServerError {
    ServerError::ConfigurationError(format!("Could not build a redirect URL. {e}"))
}

//----------------------------------------------   Free checkout  ----------------------------------------------------
route!(free_checkout => Get "/free" impl CheckoutDatabase);
/// Places an order for the user's open basket if it costs nothing, and redirects to the receipt page.
///
/// Users with an empty basket (or none at all) are sent back to the basket summary page. A basket that is not free
/// gives a 400.
pub async fn free_checkout<B: CheckoutDatabase>(
    claims: JwtClaims,
    accounts: web::Data<AccountApi<B>>,
    api: web::Data<CheckoutFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET free checkout for {}", claims.username);
    let user = current_user(&claims, accounts.as_ref()).await?;
    let site = api.site();
    match api.free_checkout(&user).await? {
        FreeCheckoutResult::EmptyBasket => {
            let url = site.build_ecommerce_url(&site.basket_summary_path).map_err(url_error)?;
            Ok(redirect(url.as_str()))
        },
        FreeCheckoutResult::OrderPlaced(order) => {
            let receipt = get_receipt_page_url(site, Some(order.number.as_str())).map_err(url_error)?;
            let url = get_lms_url(site, &receipt).map_err(url_error)?;
            Ok(redirect(&url))
        },
    }
}

//----------------------------------------------   Receipt  ----------------------------------------------------
// The receipt link handed to the gateway carries a trailing slash.
route!(receipt => Get ["/receipt", "/receipt/"] impl CheckoutDatabase);
/// The data behind the receipt page.
///
/// Staff can view any order on the site. Everyone else only sees their own orders; anything else is reported as not
/// found. Verification and credit details are only included for the user who placed the order.
pub async fn receipt<B: CheckoutDatabase>(
    claims: JwtClaims,
    query: web::Query<ReceiptQuery>,
    accounts: web::Data<AccountApi<B>>,
    api: web::Data<CheckoutFlowApi<B>>,
    credit: web::Data<CreditProviders>,
) -> Result<HttpResponse, ServerError> {
    let user = current_user(&claims, accounts.as_ref()).await?;
    let order = match query.into_inner().order_number {
        Some(number) => api.receipt_order(&user, &OrderNumber::from(number)).await?,
        None => None,
    };
    let Some(order) = order else {
        return receipt_not_found(api.site());
    };
    debug!("💻️ GET receipt for order [{}] by {}", order.number, user.username);
    let (providers, verified_course_id) = if order.user_id == user.id {
        (credit.for_order(&order).await, verified_course_id(&order))
    } else {
        Default::default()
    };
    let payment_method = order.payment_source().map(|s| format!("{} {}", s.card_type, s.label));
    let response = ReceiptResponse { name: user.full_name(), payment_method, providers, verified_course_id, order };
    Ok(HttpResponse::Ok().json(response))
}

fn receipt_not_found(site: &SiteConfig) -> Result<HttpResponse, ServerError> {
    let order_history_url = get_lms_url(site, "account/settings").map_err(url_error)?;
    Ok(HttpResponse::NotFound().json(ReceiptNotFound { order_history_url }))
}

/// The course key of the first line that requires identity verification.
pub fn verified_course_id(order: &Order) -> Option<String> {
    order.lines.iter().find(|l| l.id_verification_required).and_then(|l| l.course_key.clone())
}

//----------------------------------------------   Cancel / Error  --------------------------------------------------
// Gateways post customers back to these pages, so POST is accepted as well as GET.
#[route("/cancel-checkout", method = "GET", method = "POST")]
pub async fn cancel_checkout(site: web::Data<SiteConfig>) -> impl Responder {
    debug!("💻️ Checkout cancelled");
    HttpResponse::Ok().json(SupportDetails { payment_support_email: site.payment_support_email.clone() })
}

#[route("/error", method = "GET", method = "POST")]
pub async fn checkout_error(site: web::Data<SiteConfig>) -> impl Responder {
    debug!("💻️ Checkout error page requested");
    HttpResponse::Ok().json(SupportDetails { payment_support_email: site.payment_support_email.clone() })
}
