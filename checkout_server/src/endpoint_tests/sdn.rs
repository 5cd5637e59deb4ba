use std::{collections::HashMap, time::Duration};

use actix_web::{web, web::ServiceConfig, HttpResponse};
use checkout_clients::SdnConfig;
use checkout_common::Secret;
use checkout_engine::{db_types::NewSdnCheckFailure, traits::RecordError};
use serde_json::json;

use super::{
    helpers::{mock_server, recorded_sdn_failure},
    mocks::MockCheckoutStore,
};
use crate::integrations::SdnChecker;

async fn search(q: web::Query<HashMap<String, String>>) -> HttpResponse {
    if q.get("api_key").map(String::as_str) != Some("sdn-key") {
        return HttpResponse::Unauthorized().finish();
    }
    match q.get("name").map(String::as_str) {
        Some("Bad Actor") => HttpResponse::Ok().json(json!({"total": 2, "results": [{"name": "Bad Actor"}, {"name": "B. Actor"}]})),
        Some("Garbled") => HttpResponse::Ok().body("<html>Service temporarily unavailable</html>"),
        _ => HttpResponse::Ok().json(json!({"total": 0, "results": []})),
    }
}

fn sdn_routes(cfg: &mut ServiceConfig) {
    cfg.route("/search", web::get().to(search));
}

fn config(base: &str) -> SdnConfig {
    SdnConfig {
        api_url: format!("{base}/search"),
        api_key: Secret::new("sdn-key".into()),
        sources: "SDN,ISN".into(),
        timeout: Some(Duration::from_secs(2)),
    }
}

fn no_records() -> MockCheckoutStore {
    let mut store = MockCheckoutStore::new();
    store.expect_record_sdn_check_failure().never();
    store
}

#[actix_web::test]
async fn disabled_checker_always_passes() {
    let checker = SdnChecker::new(false, SdnConfig::default(), no_records()).unwrap();
    assert!(!checker.is_enabled());
    assert!(checker.passes("Bad Actor", "", Some("bad"), 1).await);
    assert!(SdnChecker::disabled(no_records()).passes("Bad Actor", "", None, 1).await);
}

#[actix_web::test]
async fn buyers_without_a_match_pass() {
    let base = mock_server(sdn_routes).await;
    let checker = SdnChecker::new(true, config(&base), no_records()).unwrap();
    assert!(checker.is_enabled());
    assert!(checker.passes("Ada Lovelace", "12 St James's Square London GB", Some("ada"), 7).await);
}

#[actix_web::test]
async fn matches_fail_and_are_recorded() {
    let base = mock_server(sdn_routes).await;
    let mut store = MockCheckoutStore::new();
    store
        .expect_record_sdn_check_failure()
        .times(1)
        .withf(|f: &NewSdnCheckFailure| {
            f.full_name == "Bad Actor" &&
                f.username.as_deref() == Some("bad") &&
                f.basket_id == Some(7) &&
                f.sdn_check_response.contains("\"total\":2")
        })
        .returning(|f| Ok(recorded_sdn_failure(f)));
    let checker = SdnChecker::new(true, config(&base), store).unwrap();
    assert!(!checker.passes("Bad Actor", "1 Main St", Some("bad"), 7).await);
}

#[actix_web::test]
async fn matches_fail_even_if_they_cannot_be_recorded() {
    let base = mock_server(sdn_routes).await;
    let mut store = MockCheckoutStore::new();
    store
        .expect_record_sdn_check_failure()
        .times(1)
        .returning(|_| Err(RecordError::DatabaseError("database is locked".into())));
    let checker = SdnChecker::new(true, config(&base), store).unwrap();
    assert!(!checker.passes("Bad Actor", "", None, 7).await);
}

#[actix_web::test]
async fn unreadable_responses_pass() {
    let base = mock_server(sdn_routes).await;
    let checker = SdnChecker::new(true, config(&base), no_records()).unwrap();
    assert!(checker.passes("Garbled", "", Some("ada"), 7).await);
}

#[actix_web::test]
async fn rejected_api_keys_pass() {
    let base = mock_server(sdn_routes).await;
    let config = SdnConfig { api_key: Secret::new("wrong-key".into()), ..config(&base) };
    let checker = SdnChecker::new(true, config, no_records()).unwrap();
    assert!(checker.passes("Bad Actor", "", Some("bad"), 7).await);
}

#[actix_web::test]
async fn unreachable_api_passes() {
    let config = SdnConfig { timeout: Some(Duration::from_secs(1)), ..config("http://127.0.0.1:9") };
    let checker = SdnChecker::new(true, config, no_records()).unwrap();
    assert!(checker.passes("Bad Actor", "", Some("bad"), 7).await);
}
