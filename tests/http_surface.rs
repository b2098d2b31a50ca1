//! Session routes exercised through `actix_web::test` with the in-process
//! backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use serde_json::{json, Value};
use uuid::Uuid;

use common::fake::{dec, FakeBackend};
use order_composer::domain::errors::{BackendError, FieldViolation};
use order_composer::{configure, Backend, SessionRegistry, SessionSettings};

fn registry(fake: &Arc<FakeBackend>) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(
        Backend::shared(fake.clone()),
        SessionSettings {
            debounce: Duration::from_millis(20),
            ..SessionSettings::default()
        },
    ))
}

async fn open<S>(app: &S) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/sessions")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    format!("/sessions/{}", body["id"].as_str().unwrap())
}

async fn edit<S>(app: &S, session: &str, body: Value) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(&format!("{}/edits", session))
        .set_json(body)
        .to_request();
    test::call_and_read_body_json(app, req).await
}

async fn snapshot<S>(app: &S, session: &str) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get().uri(session).to_request();
    test::call_and_read_body_json(app, req).await
}

/// Poll until every item is quoted or failed and nothing is settling.
async fn settled<S>(app: &S, session: &str) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    for _ in 0..100 {
        let body = snapshot(app, session).await;
        let items = body["items"].as_array().cloned().unwrap_or_default();
        let done = !items.is_empty()
            && items
                .iter()
                .all(|i| i["status"] == "quoted" || i["status"] == "failed")
            && body["settling"] == false;
        if done {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session {} never settled", session);
}

async fn shirt_order<S>(app: &S, session: &str, fake: &FakeBackend, shirts: usize) -> Vec<String>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let c = fake.catalog;
    edit(
        app,
        session,
        json!({ "type": "set_customer", "customer_id": Uuid::new_v4() }),
    )
    .await;
    let mut ids = Vec::new();
    for _ in 0..shirts {
        let added = edit(app, session, json!({ "type": "add_item" })).await;
        let id = added["item_id"].as_str().unwrap().to_string();
        edit(
            app,
            session,
            json!({ "type": "set_product_type", "item_id": id, "product_type_id": c.shirt }),
        )
        .await;
        edit(
            app,
            session,
            json!({ "type": "set_action", "item_id": id, "action_id": c.iron }),
        )
        .await;
        ids.push(id);
    }
    ids
}

#[actix_web::test]
async fn session_lifecycle_over_http() {
    let fake = FakeBackend::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(registry(&fake)))
            .configure(configure),
    )
    .await;
    let session = open(&app).await;

    let req = test::TestRequest::get()
        .uri(&format!("{}/catalog", session))
        .to_request();
    let catalog: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(catalog["product_types"].as_array().map(Vec::len), Some(2));
    let strategies: Vec<&str> = catalog["offerings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|o| o["pricing_strategy"].as_str())
        .collect();
    assert!(strategies.contains(&"fixed"));
    assert!(strategies.contains(&"dimension_based"));

    let ids = shirt_order(&app, &session, &fake, 1).await;
    edit(
        &app,
        &session,
        json!({ "type": "set_quantity", "item_id": ids[0], "quantity": "5" }),
    )
    .await;

    let body = settled(&app, &session).await;
    assert_eq!(body["items"][0]["applied_unit"], "piece");
    assert_eq!(dec(body["total"].as_str().unwrap()), dec("15"));
    assert_eq!(body["can_submit"], true);
    assert_eq!(body["blockers"], json!([]));

    let req = test::TestRequest::post()
        .uri(&format!("{}/submit", session))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["order_id"].as_str().is_some());
    assert_eq!(fake.submissions().len(), 1);

    let req = test::TestRequest::get().uri(&session).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn blocked_submission_lists_reasons() {
    let fake = FakeBackend::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(registry(&fake)))
            .configure(configure),
    )
    .await;
    let session = open(&app).await;
    let added = edit(&app, &session, json!({ "type": "add_item" })).await;
    let item_id = added["item_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("{}/submit", session))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["blockers"],
        json!([
            { "reason": "no_customer", "item_id": null },
            { "reason": "item_incomplete", "item_id": item_id },
        ])
    );
}

#[actix_web::test]
async fn rejected_submission_maps_errors_to_items() {
    let fake = FakeBackend::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(registry(&fake)))
            .configure(configure),
    )
    .await;
    let session = open(&app).await;
    let ids = shirt_order(&app, &session, &fake, 2).await;
    settled(&app, &session).await;

    fake.fail_next_submission(BackendError::Validation(vec![FieldViolation {
        key: "items[1].description".to_string(),
        message: "is required".to_string(),
    }]));
    let req = test::TestRequest::post()
        .uri(&format!("{}/submit", session))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["items"][0]["index"], 1);
    assert_eq!(body["items"][0]["item_id"], ids[1]);
    assert_eq!(body["items"][0]["field"], "description");
    assert_eq!(body["items"][0]["message"], "is required");
    assert_eq!(body["general"], json!([]));
}

#[actix_web::test]
async fn unknown_sessions_and_items_are_not_found() {
    let fake = FakeBackend::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(registry(&fake)))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/sessions/{}", Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let session = open(&app).await;
    let req = test::TestRequest::post()
        .uri(&format!("{}/edits", session))
        .set_json(json!({ "type": "set_quantity", "item_id": Uuid::new_v4(), "quantity": "2" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::delete().uri(&session).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);
    let req = test::TestRequest::delete().uri(&session).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}
