use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_engine::{
    processors::Cybersource,
    AccountApi,
    CheckoutFlowApi,
    PaymentApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::{CreditProviders, SdnChecker},
    payment_routes::{CybersourceNotifyRoute, CybersourceSubmitRoute},
    routes::{cancel_checkout, checkout_error, health, FreeCheckoutRoute, ReceiptRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let site = config.site_config()?;
    info!("🚀️ Serving site {} with order prefix {}", site.site, site.partner_short_code);
    let sdn = SdnChecker::new(site.enable_sdn_check, config.sdn.clone(), db.clone())?;
    let credit = CreditProviders::new(config.lms.clone(), config.lms_access_token.clone())?;
    if sdn.is_enabled() {
        info!("🔎️ Buyers will be screened against {}", config.sdn.sources);
    }
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let accounts_api = AccountApi::new(db.clone());
        let checkout_api = CheckoutFlowApi::new(db.clone(), site.clone());
        let processor = Cybersource::new(config.cybersource.clone(), site.clone());
        let payment_api = PaymentApi::new(db.clone(), processor, site.clone());
        let validator = TokenValidator::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("chk::access_log"))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(validator))
            .app_data(web::Data::new(sdn.clone()))
            .app_data(web::Data::new(credit.clone()))
            .app_data(web::Data::new(options.clone()))
            .app_data(web::Data::new(site.clone()));
        let checkout_scope = web::scope("/checkout")
            .service(FreeCheckoutRoute::<SqliteDatabase>::new())
            .service(ReceiptRoute::<SqliteDatabase>::new())
            .service(cancel_checkout)
            .service(checkout_error);
        let payment_scope = web::scope("/payment/cybersource")
            .service(CybersourceSubmitRoute::<SqliteDatabase, Cybersource>::new())
            .service(CybersourceNotifyRoute::<SqliteDatabase, Cybersource>::new());
        app.service(health).service(checkout_scope).service(payment_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
