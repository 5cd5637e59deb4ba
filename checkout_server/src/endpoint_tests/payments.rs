use std::time::Duration;

use actix_web::{
    cookie::Cookie,
    http::{header, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
    HttpResponse,
};
use checkout_clients::SdnConfig;
use checkout_common::Secret;
use checkout_engine::{
    db_types::{BasketStatus, NewOrder, NewProcessorResponse, NewSdnCheckFailure, OrderNumber, ProcessorFields},
    processors::Cybersource,
    test_utils::{signed_notification, test_cybersource, test_site},
    traits::{OrderError, RecordError},
    PaymentApi,
};
use serde_json::json;
use url::form_urlencoded;

use super::{
    helpers::{accounts_for, basket, bearer, call, issue_token, mock_server, placed, recorded, recorded_sdn_failure, user},
    mocks::MockCheckoutStore,
};
use crate::{
    config::ServerOptions,
    errors::{BASKET_MODIFIED_MESSAGE, BASKET_UNAVAILABLE_MESSAGE},
    integrations::SdnChecker,
    payment_routes::{CybersourceNotifyRoute, CybersourceSubmitRoute},
};

//----------------------------------------------   Submit  ----------------------------------------------------

fn submit_app(store: MockCheckoutStore, sdn: SdnChecker<MockCheckoutStore>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(accounts_for(user(1, "ada", false))))
            .app_data(web::Data::new(PaymentApi::new(store, test_cybersource(), test_site())))
            .app_data(web::Data::new(sdn))
            .service(
                web::scope("/payment/cybersource")
                    .service(CybersourceSubmitRoute::<MockCheckoutStore, Cybersource>::new()),
            );
    }
}

fn no_sdn() -> SdnChecker<MockCheckoutStore> {
    SdnChecker::disabled(MockCheckoutStore::new())
}

fn payment_form(basket: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("basket", basket),
        ("first_name", "Ada"),
        ("last_name", "Lovelace"),
        ("address_line1", "12 St James's Square"),
        ("city", "London"),
        ("postal_code", "SW1Y 4JH"),
        ("country", "GB"),
    ]
}

fn submit_request(form: &[(&str, &str)]) -> TestRequest {
    TestRequest::post()
        .uri("/payment/cybersource/submit")
        .insert_header(bearer(&issue_token(1, "ada", false)))
        .set_form(form)
}

/// Basket 7 is open and belongs to user 1. Basket 8 belongs to someone else. Basket 9 is already frozen.
fn basket_store() -> MockCheckoutStore {
    let mut store = MockCheckoutStore::new();
    store.expect_fetch_basket().returning(|id| match id {
        7 => Ok(Some(basket(7, 1, BasketStatus::Open, &[9900]))),
        8 => Ok(Some(basket(8, 2, BasketStatus::Open, &[9900]))),
        9 => Ok(Some(basket(9, 1, BasketStatus::Frozen, &[9900]))),
        _ => Ok(None),
    });
    store
}

#[actix_web::test]
async fn submit_returns_signed_fields_and_freezes_basket() {
    let mut store = basket_store();
    store
        .expect_freeze_basket()
        .times(1)
        .withf(|id| *id == 7)
        .returning(|id| Ok(basket(id, 1, BasketStatus::Frozen, &[9900])));
    let req = submit_request(&payment_form("7")).cookie(Cookie::new("sessionid", "session-123"));
    let res = call(req, submit_app(store, no_sdn())).await;
    assert_eq!(res.status, StatusCode::OK);
    let fields = &res.json()["form_fields"];
    assert_eq!(fields["reference_number"], "EDX-100007");
    assert_eq!(fields["amount"], "99.00");
    assert_eq!(fields["currency"], "USD");
    assert_eq!(fields["bill_to_forename"], "Ada");
    assert_eq!(fields["bill_to_address_country"], "GB");
    assert_eq!(fields["bill_to_email"], "ada@example.com");
    assert_eq!(fields["device_fingerprint_id"], "session-123");
    assert_eq!(fields["payment_method"], "card");
    assert_eq!(fields["unsigned_field_names"], "card_cvn,card_expiry_date,card_number,card_type");
    assert!(fields["signature"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(fields.get("payment_page_url").is_none());
}

#[actix_web::test]
async fn submit_reports_missing_fields() {
    let mut store = MockCheckoutStore::new();
    store.expect_fetch_basket().never();
    let form = [("basket", "7"), ("first_name", "Ada"), ("country", "US")];
    let res = call(submit_request(&form), submit_app(store, no_sdn())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json(),
        json!({"field_errors": {
            "address_line1": "This field is required.",
            "city": "This field is required.",
            "last_name": "This field is required.",
            "state": "This field is required.",
        }})
    );
}

#[actix_web::test]
async fn submit_rejects_malformed_basket_ids() {
    let res = call(submit_request(&payment_form("seven")), submit_app(MockCheckoutStore::new(), no_sdn())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json(), json!({"error": BASKET_UNAVAILABLE_MESSAGE}));
}

#[actix_web::test]
async fn submit_rejects_unknown_and_foreign_baskets() {
    for id in ["8", "404"] {
        let mut store = basket_store();
        store.expect_freeze_basket().never();
        let res = call(submit_request(&payment_form(id)), submit_app(store, no_sdn())).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "basket {id}");
        assert_eq!(res.json(), json!({"error": BASKET_UNAVAILABLE_MESSAGE}));
    }
}

#[actix_web::test]
async fn submit_rejects_baskets_that_are_not_open() {
    let mut store = basket_store();
    store.expect_freeze_basket().never();
    let res = call(submit_request(&payment_form("9")), submit_app(store, no_sdn())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json(), json!({"error": BASKET_MODIFIED_MESSAGE}));
}

async fn sdn_search(q: web::Query<std::collections::HashMap<String, String>>) -> HttpResponse {
    match q.get("name").map(String::as_str) {
        Some("Ada Lovelace") => HttpResponse::Ok().json(json!({"total": 1, "results": [{"name": "Ada Lovelace"}]})),
        _ => HttpResponse::Ok().json(json!({"total": 0, "results": []})),
    }
}

fn sdn_routes(cfg: &mut ServiceConfig) {
    cfg.route("/search", web::get().to(sdn_search));
}

#[actix_web::test]
async fn submit_blocks_sdn_matches() {
    let base = mock_server(sdn_routes).await;
    let config = SdnConfig {
        api_url: format!("{base}/search"),
        api_key: Secret::new("sdn-key".into()),
        sources: "SDN,ISN".into(),
        timeout: Some(Duration::from_secs(2)),
    };
    let mut records = MockCheckoutStore::new();
    records
        .expect_record_sdn_check_failure()
        .times(1)
        .withf(|f: &NewSdnCheckFailure| f.full_name == "Ada Lovelace" && f.basket_id == Some(7))
        .returning(|f| Ok(recorded_sdn_failure(f)));
    let sdn = SdnChecker::new(true, config, records).unwrap();
    let mut store = basket_store();
    store.expect_freeze_basket().never();
    let res = call(submit_request(&payment_form("7")), submit_app(store, sdn)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json(),
        json!({"error": "We were unable to process your purchase. Contact support@example.com for assistance."})
    );
}

//----------------------------------------------   Notify  ----------------------------------------------------

fn notify_app(store: MockCheckoutStore, options: ServerOptions) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(PaymentApi::new(store, test_cybersource(), test_site())))
            .app_data(web::Data::new(options))
            .service(
                web::scope("/payment/cybersource")
                    .service(CybersourceNotifyRoute::<MockCheckoutStore, Cybersource>::new()),
            );
    }
}

fn notify_request(fields: &ProcessorFields) -> TestRequest {
    TestRequest::post().uri("/payment/cybersource/notify").set_form(fields)
}

/// Basket 7 belongs to user 1, and every notification is recorded exactly once.
fn notify_store(expected_basket: Option<i64>) -> MockCheckoutStore {
    let mut store = basket_store();
    store
        .expect_record_processor_response()
        .times(1)
        .withf(move |r: &NewProcessorResponse| r.basket_id == expected_basket && r.processor_name == "cybersource")
        .returning(|r| Ok(recorded(r)));
    store
}

#[actix_web::test]
async fn accepted_payment_places_order() {
    let mut store = notify_store(Some(7));
    store
        .expect_place_order()
        .times(1)
        .withf(|o: &NewOrder| {
            o.number == OrderNumber::from("EDX-100007".to_string()) &&
                o.user_id == 1 &&
                o.total.value() == 9900 &&
                o.billing_address.as_ref().is_some_and(|a| a.first_name == "Ada" && a.country == "GB") &&
                o.payment_source.as_ref().is_some_and(|s| s.card_type == "Visa")
        })
        .returning(|o| Ok(placed(o)));
    let fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    let res = call(notify_request(&fields), notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.is_empty());
}

#[actix_web::test]
async fn duplicate_notification_is_acknowledged() {
    let mut store = notify_store(Some(7));
    store.expect_place_order().times(1).returning(|o| Err(OrderError::OrderAlreadyExists(o.number)));
    let fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    let res = call(notify_request(&fields), notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn tampered_notification_is_rejected() {
    let mut store = notify_store(Some(7));
    store.expect_place_order().never();
    let mut fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    fields.insert("req_amount".into(), "0.99".into());
    let res = call(notify_request(&fields), notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn notification_for_unknown_basket_is_recorded_and_rejected() {
    let mut store = notify_store(None);
    store.expect_place_order().never();
    let fields = signed_notification("EDX-100404", "ACCEPT", "99.00");
    let res = call(notify_request(&fields), notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn declined_and_cancelled_payments_are_acknowledged() {
    for decision in ["DECLINE", "CANCEL", "ERROR", "REVIEW"] {
        let mut store = notify_store(Some(7));
        store.expect_place_order().never();
        let fields = signed_notification("EDX-100007", decision, "99.00");
        let res = call(notify_request(&fields), notify_app(store, ServerOptions::default())).await;
        assert_eq!(res.status, StatusCode::OK, "{decision}");
    }
}

#[actix_web::test]
async fn failure_to_record_asks_for_a_retry() {
    let mut store = basket_store();
    store
        .expect_record_processor_response()
        .times(1)
        .returning(|_| Err(RecordError::DatabaseError("disk I/O error".into())));
    store.expect_place_order().never();
    let fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    let res = call(notify_request(&fields), notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn failure_to_place_order_asks_for_a_retry() {
    let mut store = notify_store(Some(7));
    store.expect_place_order().times(1).returning(|_| Err(OrderError::DatabaseError("database is locked".into())));
    let fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    let res = call(notify_request(&fields), notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}

fn whitelisted() -> ServerOptions {
    ServerOptions {
        use_x_forwarded_for: true,
        use_forwarded: false,
        cybersource_whitelist: Some(vec!["203.0.113.10".parse().unwrap()]),
    }
}

#[actix_web::test]
async fn notifications_from_unlisted_addresses_are_refused() {
    let mut store = basket_store();
    store.expect_record_processor_response().never();
    let fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    let req = notify_request(&fields).peer_addr("198.51.100.4:40000".parse().unwrap());
    let res = call(req, notify_app(store, whitelisted())).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn notifications_from_listed_addresses_are_processed() {
    let mut store = notify_store(Some(7));
    store.expect_place_order().times(1).returning(|o| Ok(placed(o)));
    let fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    let req = notify_request(&fields)
        .peer_addr("10.0.0.2:40000".parse().unwrap())
        .insert_header(("X-Forwarded-For", "203.0.113.10"));
    let res = call(req, notify_app(store, whitelisted())).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn notifications_with_other_content_types_are_recorded() {
    let mut store = notify_store(Some(7));
    store.expect_place_order().never();
    let req = TestRequest::post()
        .uri("/payment/cybersource/notify")
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload("decision=ACCEPT&req_reference_number=EDX-100007");
    let res = call(req, notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signed_notifications_without_a_form_content_type_place_orders() {
    let mut store = notify_store(Some(7));
    store.expect_place_order().times(1).returning(|o| Ok(placed(o)));
    let fields = signed_notification("EDX-100007", "ACCEPT", "99.00");
    let body = form_urlencoded::Serializer::new(String::new()).extend_pairs(fields.iter()).finish();
    let req = TestRequest::post()
        .uri("/payment/cybersource/notify")
        .insert_header((header::CONTENT_TYPE, "application/octet-stream"))
        .set_payload(body);
    let res = call(req, notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn unreadable_notifications_are_recorded_and_rejected() {
    let mut store = notify_store(None);
    store.expect_place_order().never();
    let req = TestRequest::post()
        .uri("/payment/cybersource/notify")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(vec![0xff, 0xfe, b'{', b'%', b'z', 0x80]);
    let res = call(req, notify_app(store, ServerOptions::default())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
