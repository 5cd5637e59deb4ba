//! Handlers for the CyberSource Secure Acceptance flow.
//!
//! `submit` is called by the browser, which then posts the returned fields straight to CyberSource. `notify` is
//! called by CyberSource once the payment has been authorised (or not). The status code returned from `notify` tells
//! the gateway whether to try again:
//! * 200: the notification was dealt with, whatever the payment outcome.
//! * 400: the notification can never be processed (bad signature, unknown basket).
//! * 500: something transient failed. The gateway will resend the notification.
use actix_web::{web, HttpRequest, HttpResponse};
use checkout_engine::{
    db_types::ProcessorFields,
    payment_objects::{Disposition, PaymentForm},
    processors::PaymentProcessor,
    traits::CheckoutDatabase,
    AccountApi,
    PaymentApi,
};
use log::*;
use url::form_urlencoded;

use crate::{
    auth::{current_user, JwtClaims},
    config::ServerOptions,
    data_objects::{PaymentFormErrors, PaymentFormFields},
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
    integrations::SdnChecker,
    route,
};

/// The session cookie, used as the device fingerprint id.
pub const SESSION_COOKIE: &str = "sessionid";

//----------------------------------------------   Submit  ----------------------------------------------------
route!(cybersource_submit => Post "/submit" impl CheckoutDatabase, PaymentProcessor);
/// Validates the payment form, screens the buyer, and returns the signed fields for the payment page. The basket is
/// frozen once the fields have been generated.
pub async fn cybersource_submit<B, P>(
    req: HttpRequest,
    claims: JwtClaims,
    form: web::Form<PaymentForm>,
    accounts: web::Data<AccountApi<B>>,
    api: web::Data<PaymentApi<B, P>>,
    sdn: web::Data<SdnChecker<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    P: PaymentProcessor,
{
    trace!("💳️ Received payment submission from {}", claims.username);
    let user = current_user(&claims, accounts.as_ref()).await?;
    let (basket_id, billing) = match form.into_inner().validate() {
        Ok(valid) => valid,
        Err(errors) if errors.contains_key("basket") => {
            debug!("💳️ Payment form from {} has an invalid basket. {errors:?}", user.username);
            return Err(ServerError::BasketUnavailable);
        },
        Err(errors) => {
            debug!("💳️ Payment form from {} is invalid. {errors:?}", user.username);
            return Ok(HttpResponse::BadRequest().json(PaymentFormErrors { field_errors: errors }));
        },
    };
    let basket = api.fetch_basket_for_submission(&user, basket_id).await.map_err(|e| {
        debug!("💳️ Basket #{basket_id} cannot be submitted by {}. {e}", user.username);
        ServerError::from(e)
    })?;
    if !sdn.passes(&billing.full_name(), &billing.full_address(), Some(&user.username), basket.id).await {
        info!("💳️ Purchase of basket #{} by {} blocked by the SDN check", basket.id, user.username);
        return Err(ServerError::PurchaseBlocked(api.site().payment_support_email.clone()));
    }
    let session_id = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
    let form_fields = api.submit_payment(&user, basket, &billing, session_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(PaymentFormFields { form_fields }))
}

//----------------------------------------------   Notify  ----------------------------------------------------
route!(cybersource_notify => Post "/notify" impl CheckoutDatabase, PaymentProcessor);
/// Receives the payment notification from CyberSource.
///
/// The notification is recorded before anything else happens to it. See [`PaymentApi::handle_notification`].
pub async fn cybersource_notify<B, P>(
    req: HttpRequest,
    options: web::Data<ServerOptions>,
    body: web::Bytes,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    P: PaymentProcessor,
{
    check_whitelist(&req, options.as_ref())?;
    let fields = notification_fields(&body);
    trace!("🧾️ Received payment notification with {} fields", fields.len());
    let outcome = api.handle_notification(fields).await;
    let response = match outcome.disposition() {
        Disposition::Acknowledge => HttpResponse::Ok().finish(),
        Disposition::Reject => HttpResponse::BadRequest().finish(),
        Disposition::Retry => HttpResponse::InternalServerError().finish(),
    };
    Ok(response)
}

/// Decodes a notification body as url-encoded pairs, whatever content type it was sent with. Invalid UTF-8 is
/// replaced rather than rejected, so that every notification reaches the audit log.
fn notification_fields(body: &[u8]) -> ProcessorFields {
    form_urlencoded::parse(body).into_owned().collect()
}

/// Refuses requests from addresses that are not on the notification whitelist, if there is one.
fn check_whitelist(req: &HttpRequest, options: &ServerOptions) -> Result<(), ServerError> {
    let Some(whitelist) = &options.cybersource_whitelist else {
        return Ok(());
    };
    match get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded) {
        Some(ip) if whitelist.contains(&ip) => {
            info!("🧾️ Payment notification from {ip}");
            Ok(())
        },
        Some(ip) => {
            warn!("🧾️ Payment notification from {ip}, which is not whitelisted. The request is rejected.");
            Err(AuthError::ForbiddenPeer.into())
        },
        None => {
            warn!("🧾️ No IP address found for a payment notification. The request is rejected.");
            Err(AuthError::ForbiddenPeer.into())
        },
    }
}
