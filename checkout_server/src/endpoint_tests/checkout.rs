use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig, HttpResponse};
use checkout_clients::LmsConfig;
use checkout_common::Secret;
use checkout_engine::{
    db_types::{BasketStatus, NewOrder, OrderNumber, PaymentSource, ShippingMethod, Voucher},
    helpers::{get_receipt_page_url, SiteConfig},
    test_utils::test_site,
    CheckoutFlowApi,
};
use serde_json::json;
use url::Url;

use super::{
    helpers::{accounts_for, basket, bearer, call, issue_token, mock_server, placed, user},
    mocks::MockCheckoutStore,
};
use crate::{
    integrations::CreditProviders,
    routes::{cancel_checkout, checkout_error, FreeCheckoutRoute, ReceiptRoute},
};

//----------------------------------------------   Free checkout  ----------------------------------------------------

fn free_checkout_app(store: MockCheckoutStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(accounts_for(user(1, "ada", false))))
            .app_data(web::Data::new(CheckoutFlowApi::new(store, test_site())))
            .service(web::scope("/checkout").service(FreeCheckoutRoute::<MockCheckoutStore>::new()));
    }
}

fn free_checkout_request(token: &str) -> TestRequest {
    TestRequest::get().uri("/checkout/free").insert_header(bearer(token))
}

#[actix_web::test]
async fn free_checkout_redirects_to_receipt() {
    let mut store = MockCheckoutStore::new();
    store.expect_fetch_open_basket_for_user().returning(|user_id, _| {
        let mut b = basket(3, user_id, BasketStatus::Open, &[9900]);
        b.voucher_code = Some("FREE".into());
        Ok(Some(b))
    });
    store.expect_fetch_voucher().returning(|code| Ok(Some(Voucher { code: code.to_string(), percent_off: 100 })));
    store
        .expect_place_order()
        .times(1)
        .withf(|o: &NewOrder| {
            o.total.is_zero() && o.billing_address.is_none() && o.payment_source.is_none() && o.user_id == 1
        })
        .returning(|o| Ok(placed(o)));
    let res = call(free_checkout_request(&issue_token(1, "ada", false)), free_checkout_app(store)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some("https://lms.example.com/commerce/checkout/receipt?orderNum=EDX-100003"));
}

#[actix_web::test]
async fn free_checkout_redirects_to_otto_receipt() {
    let mut store = MockCheckoutStore::new();
    store.expect_fetch_open_basket_for_user().returning(|user_id, _| {
        let mut b = basket(3, user_id, BasketStatus::Open, &[9900]);
        b.voucher_code = Some("FREE".into());
        Ok(Some(b))
    });
    store.expect_fetch_voucher().returning(|code| Ok(Some(Voucher { code: code.to_string(), percent_off: 100 })));
    store.expect_place_order().times(1).returning(|o| Ok(placed(o)));
    let app = move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(accounts_for(user(1, "ada", false))))
            .app_data(web::Data::new(CheckoutFlowApi::new(store, otto_site())))
            .service(web::scope("/checkout").service(FreeCheckoutRoute::<MockCheckoutStore>::new()));
    };
    let res = call(free_checkout_request(&issue_token(1, "ada", false)), app).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some("https://shop.example.com/checkout/receipt/?order_number=EDX-100003"));
}

#[actix_web::test]
async fn free_checkout_with_empty_basket_goes_back_to_basket() {
    let mut store = MockCheckoutStore::new();
    store.expect_fetch_open_basket_for_user().returning(|user_id, _| Ok(Some(basket(3, user_id, BasketStatus::Open, &[]))));
    store.expect_place_order().never();
    let res = call(free_checkout_request(&issue_token(1, "ada", false)), free_checkout_app(store)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some("https://shop.example.com/basket/"));
}

#[actix_web::test]
async fn free_checkout_rejects_baskets_that_cost_money() {
    let mut store = MockCheckoutStore::new();
    store
        .expect_fetch_open_basket_for_user()
        .returning(|user_id, _| Ok(Some(basket(3, user_id, BasketStatus::Open, &[4900]))));
    store.expect_place_order().never();
    let res = call(free_checkout_request(&issue_token(1, "ada", false)), free_checkout_app(store)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json(), json!({"error": "Basket is not free."}));
}

#[actix_web::test]
async fn free_checkout_requires_a_token() {
    let res = call(TestRequest::get().uri("/checkout/free"), free_checkout_app(MockCheckoutStore::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json(), json!({"error": "Authentication Error. No access token was provided."}));
}

#[actix_web::test]
async fn free_checkout_rejects_forged_tokens() {
    let mut token = issue_token(1, "ada", false);
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let res = call(free_checkout_request(&token), free_checkout_app(MockCheckoutStore::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn free_checkout_rejects_tokens_for_unknown_accounts() {
    let res = call(free_checkout_request(&issue_token(99, "ghost", false)), free_checkout_app(MockCheckoutStore::new()))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({"error": "Authentication Error. User account not found."}));
}

//----------------------------------------------   Receipt  ----------------------------------------------------

/// Order EDX-100005 belongs to user 1 and was paid by card. Its first seat carries credit from ASU, its second needs
/// identity verification.
fn receipt_store() -> MockCheckoutStore {
    let mut store = MockCheckoutStore::new();
    store.expect_fetch_order_by_number().returning(|number: &OrderNumber| {
        if number.as_str() != "EDX-100005" {
            return Ok(None);
        }
        let mut b = basket(5, 1, BasketStatus::Submitted, &[9900, 4900]);
        b.lines[0].credit_provider = Some("ASU".into());
        b.lines[1].id_verification_required = true;
        let order = NewOrder {
            number: number.clone(),
            basket_id: 5,
            user_id: 1,
            site: "edx".into(),
            currency: "USD".into(),
            total: b.total(),
            shipping_method: ShippingMethod::NoShippingRequired,
            shipping_charge: Default::default(),
            billing_address: None,
            payment_source: Some(PaymentSource { card_type: "Visa".into(), label: "xxxxxxxxxxxx1111".into() }),
            lines: b.lines,
        };
        Ok(Some(placed(order)))
    });
    store
}

fn receipt_app(viewer: (i64, &'static str, bool), lms_root: String) -> impl FnOnce(&mut ServiceConfig) {
    receipt_app_for_site(test_site(), viewer, lms_root)
}

fn receipt_app_for_site(
    site: SiteConfig,
    viewer: (i64, &'static str, bool),
    lms_root: String,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let credit = CreditProviders::new(LmsConfig::new(lms_root), Secret::new("lms-token".into())).unwrap();
        cfg.app_data(web::Data::new(accounts_for(user(viewer.0, viewer.1, viewer.2))))
            .app_data(web::Data::new(CheckoutFlowApi::new(receipt_store(), site)))
            .app_data(web::Data::new(credit))
            .service(web::scope("/checkout").service(ReceiptRoute::<MockCheckoutStore>::new()));
    }
}

fn receipt_request(token: &str, query: &str) -> TestRequest {
    TestRequest::get().uri(&format!("/checkout/receipt{query}")).insert_header(bearer(token))
}

async fn providers(req: actix_web::HttpRequest, q: web::Query<std::collections::HashMap<String, String>>) -> HttpResponse {
    let authorised = req.headers().get("Authorization").and_then(|v| v.to_str().ok()) == Some("Bearer lms-token");
    match (authorised, q.get("provider_ids").map(String::as_str)) {
        (true, Some("ASU")) => {
            HttpResponse::Ok().json(json!([{"id": "ASU", "display_name": "Arizona State University"}]))
        },
        _ => HttpResponse::Forbidden().finish(),
    }
}

fn lms_routes(cfg: &mut ServiceConfig) {
    cfg.route("/api/credit/v1/providers/", web::get().to(providers));
}

#[actix_web::test]
async fn owner_sees_full_receipt() {
    let lms = mock_server(lms_routes).await;
    let token = issue_token(1, "ada", false);
    let res = call(receipt_request(&token, "?order_number=EDX-100005"), receipt_app((1, "ada", false), lms)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["payment_method"], "Visa xxxxxxxxxxxx1111");
    assert_eq!(body["verified_course_id"], "course-v1:edX+Demo1+2024");
    assert_eq!(body["providers"]["ASU"]["display_name"], "Arizona State University");
    assert_eq!(body["order"]["number"], "EDX-100005");
    assert_eq!(body["order"]["lines"].as_array().map(Vec::len), Some(2));
}

fn otto_site() -> SiteConfig {
    let mut site = test_site();
    site.enable_otto_receipt_page = true;
    site
}

/// Path and query of an absolute URL, as the browser would request it from this server.
fn local_part(url: &str) -> String {
    let url = Url::parse(url).unwrap();
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

#[actix_web::test]
async fn otto_receipt_links_resolve() {
    let lms = mock_server(lms_routes).await;
    let url = get_receipt_page_url(&otto_site(), Some("EDX-100005")).unwrap();
    assert_eq!(url, "https://shop.example.com/checkout/receipt/?order_number=EDX-100005");
    let req = TestRequest::get().uri(&local_part(&url)).insert_header(bearer(&issue_token(1, "ada", false)));
    let res = call(req, receipt_app_for_site(otto_site(), (1, "ada", false), lms)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["order"]["number"], "EDX-100005");
}

#[actix_web::test]
async fn receipt_survives_lms_outage() {
    let token = issue_token(1, "ada", false);
    let lms = "http://127.0.0.1:9".to_string();
    let res = call(receipt_request(&token, "?order_number=EDX-100005"), receipt_app((1, "ada", false), lms)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["providers"], json!({}));
}

#[actix_web::test]
async fn staff_see_other_receipts_without_personal_details() {
    let token = issue_token(2, "admin", true);
    let lms = "http://127.0.0.1:9".to_string();
    let res = call(receipt_request(&token, "?order_number=EDX-100005"), receipt_app((2, "admin", true), lms)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["providers"], json!({}));
    assert!(body["verified_course_id"].is_null());
}

#[actix_web::test]
async fn other_users_receipts_are_not_found() {
    let token = issue_token(2, "eve", false);
    let lms = "http://127.0.0.1:9".to_string();
    let res = call(receipt_request(&token, "?order_number=EDX-100005"), receipt_app((2, "eve", false), lms)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json(), json!({"order_history_url": "https://lms.example.com/account/settings"}));
}

#[actix_web::test]
async fn receipt_without_order_number_is_not_found() {
    let token = issue_token(1, "ada", false);
    let lms = "http://127.0.0.1:9".to_string();
    let res = call(receipt_request(&token, ""), receipt_app((1, "ada", false), lms)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

//----------------------------------------------   Cancel / Error  --------------------------------------------------

fn support_pages(cfg: &mut ServiceConfig) {
    cfg.app_data(web::Data::new(test_site()))
        .service(web::scope("/checkout").service(cancel_checkout).service(checkout_error));
}

#[actix_web::test]
async fn support_pages_accept_get_and_post() {
    for path in ["/checkout/cancel-checkout", "/checkout/error"] {
        for req in [TestRequest::get(), TestRequest::post()] {
            let res = call(req.uri(path), support_pages).await;
            assert_eq!(res.status, StatusCode::OK, "{path}");
            assert_eq!(res.json(), json!({"payment_support_email": "support@example.com"}));
        }
    }
}
