//! A throwaway REST backend served by actix-web on a free local port.

use std::str::FromStr;
use std::sync::Mutex;

use actix_web::{web, App, HttpResponse, HttpServer};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use uuid::Uuid;

use super::fake::Catalog;

pub struct MockState {
    pub catalog: Catalog,
    pub existing_order: Uuid,
    pub existing_line: Uuid,
    pub quotes: Mutex<Vec<Value>>,
    pub orders: Mutex<Vec<Value>>,
}

pub struct MockBackend {
    pub url: String,
    pub state: web::Data<MockState>,
}

pub async fn start() -> MockBackend {
    let state = web::Data::new(MockState {
        catalog: Catalog::new(),
        existing_order: Uuid::new_v4(),
        existing_line: Uuid::new_v4(),
        quotes: Mutex::new(Vec::new()),
        orders: Mutex::new(Vec::new()),
    });
    let data = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/offerings", web::get().to(offerings))
            .route("/product-types", web::get().to(product_types))
            .route("/service-actions", web::get().to(service_actions))
            .route("/pricing/quote", web::post().to(quote))
            .route("/orders", web::post().to(create_order))
            .route("/orders/{id}", web::get().to(get_order))
            .route("/orders/{id}", web::put().to(update_order))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind mock backend");
    let addr = server.addrs()[0];
    tokio::spawn(server.run());

    MockBackend {
        url: format!("http://{}", addr),
        state,
    }
}

async fn offerings(state: web::Data<MockState>) -> HttpResponse {
    let c = &state.catalog;
    HttpResponse::Ok().json(json!([
        {
            "id": c.rug_wash,
            "product_type_id": c.rug,
            "action_id": c.wash,
            "pricing_strategy": "dimension_based",
            "price_per_square_meter": "8.00",
            "minimum_price": "20"
        },
        {
            "id": c.shirt_iron,
            "product_type_id": c.shirt,
            "action_id": c.iron,
            "pricing_strategy": "fixed",
            "base_price": "3.00"
        }
    ]))
}

async fn product_types(state: web::Data<MockState>) -> HttpResponse {
    HttpResponse::Ok().json(json!([
        { "id": state.catalog.rug, "name": "Rug" },
        { "id": state.catalog.shirt, "name": "Shirt" }
    ]))
}

async fn service_actions(state: web::Data<MockState>) -> HttpResponse {
    HttpResponse::Ok().json(json!([
        { "id": state.catalog.wash, "name": "Wash" },
        { "id": state.catalog.iron, "name": "Iron" }
    ]))
}

fn field_decimal(body: &Value, field: &str) -> BigDecimal {
    body[field]
        .as_str()
        .and_then(|s| BigDecimal::from_str(s).ok())
        .unwrap_or_default()
}

async fn quote(state: web::Data<MockState>, body: web::Json<Value>) -> HttpResponse {
    let body = body.into_inner();
    state.quotes.lock().unwrap().push(body.clone());

    let quantity = body["quantity"].as_u64().unwrap_or(0);
    if quantity > 100 {
        return HttpResponse::UnprocessableEntity()
            .json(json!({ "errors": { "quantity": ["must be at most 100"] } }));
    }
    let offering = body["offering_id"].as_str().unwrap_or_default();
    let quantity = BigDecimal::from(quantity);
    if offering == state.catalog.rug_wash.to_string() {
        let area = field_decimal(&body, "length") * field_decimal(&body, "width");
        let unit_price = BigDecimal::from(8) * area;
        HttpResponse::Ok().json(json!({
            "subtotal": (&unit_price * &quantity).to_string(),
            "unit_price": unit_price.to_string(),
            "applied_unit": "m²"
        }))
    } else if offering == state.catalog.shirt_iron.to_string() {
        HttpResponse::Ok().json(json!({
            "unit_price": "3.00",
            "subtotal": (BigDecimal::from(3) * &quantity).to_string(),
            "applied_unit": "piece"
        }))
    } else {
        HttpResponse::BadRequest().json(json!({ "error": "Unknown offering" }))
    }
}

async fn create_order(state: web::Data<MockState>, body: web::Json<Value>) -> HttpResponse {
    let body = body.into_inner();
    if body["notes"] == "reject" {
        return HttpResponse::UnprocessableEntity().json(json!({
            "errors": {
                "items.0.quantity": ["exceeds stock"],
                "notes": ["not allowed"]
            }
        }));
    }
    state.orders.lock().unwrap().push(body);
    HttpResponse::Created().json(json!({ "id": Uuid::new_v4() }))
}

async fn get_order(state: web::Data<MockState>, path: web::Path<Uuid>) -> HttpResponse {
    if path.into_inner() != state.existing_order {
        return HttpResponse::NotFound().json(json!({ "error": "Order not found" }));
    }
    let c = &state.catalog;
    HttpResponse::Ok().json(json!({
        "id": state.existing_order,
        "customer_id": Uuid::new_v4(),
        "notes": "ring before delivery",
        "due_date": "2026-11-02",
        "items": [
            {
                "id": state.existing_line,
                "product_type_id": c.rug,
                "action_id": c.wash,
                "quantity": 1,
                "length": "2.5",
                "width": "2"
            }
        ]
    }))
}

async fn update_order(
    state: web::Data<MockState>,
    path: web::Path<Uuid>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.orders.lock().unwrap().push(body.into_inner());
    HttpResponse::Ok().json(json!({ "id": path.into_inner() }))
}
