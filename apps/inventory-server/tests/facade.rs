//! End-to-end tests through the HTTP router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use ferreteria_db::{Database, DbConfig};
use inventory_server::auth::basic_header;
use inventory_server::services::load_authenticator;
use inventory_server::{build_router, AppState, ServerConfig};

const PATH: &str = "/InventarioService";

const ADMIN: (&str, &str) = ("admin", "FerretAdmin2024$");
const OPERATOR: (&str, &str) = ("operador", "StockManager#789");
const READER: (&str, &str) = ("consulta", "ReadOnly@456");

async fn app() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let authenticator = load_authenticator(&db, true).await.unwrap();
    let state = AppState::new(db.clone(), Arc::new(authenticator), ServerConfig::default());
    (build_router(state), db)
}

async fn call(
    app: &Router,
    who: Option<(&str, &str)>,
    operation: &str,
    args: Value,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(PATH)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some((user, password)) = who {
        builder = builder.header(header::AUTHORIZATION, basic_header(user, password));
    }
    let body = json!({ "operation": operation, "args": args }).to_string();
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap(), challenge)
}

fn hammer() -> Value {
    json!({
        "code": "abc1",
        "name": "Hammer",
        "purchasePrice": 10.00,
        "salePrice": 15.00,
        "currentStock": 5,
        "minStock": 2
    })
}

async fn register_hammer(app: &Router) -> i64 {
    let (status, body, _) = call(app, Some(ADMIN), "insertItem", hammer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successful"], json!(true), "{body}");
    body["payload"]["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_register_then_read() {
    let (app, _db) = app().await;
    register_hammer(&app).await;

    let (status, body, _) = call(&app, Some(READER), "getByCode", json!({"code": "ABC1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successful"], json!(true));
    assert_eq!(body["message"], json!("Item found"));
    let item = &body["payload"]["data"];
    assert_eq!(item["code"], json!("ABC1"));
    assert_eq!(item["salePrice"], json!("15.00"));
    assert_eq!(item["profitMargin"], json!("50.00"));
}

#[tokio::test]
async fn test_duplicate_code() {
    let (app, db) = app().await;
    register_hammer(&app).await;

    let (status, body, _) = call(&app, Some(ADMIN), "insertItem", hammer()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successful"], json!(false));
    assert_eq!(body["errorKind"], json!("VALIDATION"));
    assert_eq!(body["errorCode"], json!("DUPLICATE_CODE"));
    assert_eq!(db.items().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_adjust_stock_and_audit() {
    let (app, _db) = app().await;
    let id = register_hammer(&app).await;

    let (_, body, _) = call(
        &app,
        Some(OPERATOR),
        "adjustStock",
        json!({"id": id, "delta": -3, "reason": "sale"}),
    )
    .await;
    assert_eq!(body["successful"], json!(true), "{body}");
    assert_eq!(body["payload"]["data"]["currentStock"], json!(2));
    assert_eq!(body["warnings"], json!(["low stock"]));

    let (_, body, _) = call(&app, Some(READER), "listMovements", json!({"itemId": id})).await;
    assert_eq!(body["message"], json!("1 movements"));
    let movement = &body["payload"]["data"][0];
    assert_eq!(movement["kind"], json!("EXIT"));
    assert_eq!(movement["quantity"], json!(3));
    assert_eq!(movement["stockBefore"], json!(5));
    assert_eq!(movement["stockAfter"], json!(2));
    assert_eq!(movement["user"], json!("operador"));
}

#[tokio::test]
async fn test_insufficient_stock() {
    let (app, _db) = app().await;
    let id = register_hammer(&app).await;

    let (status, body, _) = call(
        &app,
        Some(OPERATOR),
        "adjustStock",
        json!({"id": id, "delta": -10}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successful"], json!(false));
    assert_eq!(body["errorKind"], json!("VALIDATION"));
    assert_eq!(body["errorCode"], json!("INSUFFICIENT_STOCK"));

    let (_, body, _) = call(&app, Some(READER), "getById", json!({"id": id})).await;
    assert_eq!(body["payload"]["data"]["currentStock"], json!(5));
    let (_, body, _) = call(&app, Some(READER), "listMovements", json!({"itemId": id})).await;
    assert_eq!(body["payload"]["data"], json!([]));
}

#[tokio::test]
async fn test_low_stock_listing() {
    let (app, _db) = app().await;
    let id = register_hammer(&app).await;
    call(&app, Some(OPERATOR), "registerExit", json!({"id": id, "quantity": 3})).await;

    let (_, body, _) = call(&app, Some(READER), "listLowStock", json!({})).await;
    let items = body["payload"]["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["lowStock"], json!(true));
}

#[tokio::test]
async fn test_readonly_cannot_insert() {
    let (app, db) = app().await;

    let (status, body, _) = call(&app, Some(READER), "insertItem", hammer()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorKind"], json!("FORBIDDEN"));
    assert_eq!(db.items().count().await.unwrap(), 0);

    let (status, body, _) = call(&app, Some(READER), "getByCode", json!({"code": "ABC1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errorKind"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_operator_cannot_retire() {
    let (app, _db) = app().await;
    let id = register_hammer(&app).await;

    let (status, _, _) = call(&app, Some(OPERATOR), "retireItem", json!({"id": id})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body, _) = call(&app, Some(ADMIN), "retireItem", json!({"id": id})).await;
    assert_eq!(body["successful"], json!(true));
    let (_, body, _) = call(&app, Some(READER), "listAll", json!({})).await;
    assert_eq!(body["message"], json!("0 active items"));
}

#[tokio::test]
async fn test_missing_or_bad_credentials() {
    let (app, _db) = app().await;

    let (status, body, challenge) = call(&app, None, "listAll", json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorKind"], json!("AUTH"));
    assert_eq!(body["errorCode"], json!("AUTH_REQUIRED"));
    assert_eq!(challenge.as_deref(), Some("Basic realm=\"InventarioService\""));

    let (status, body, _) = call(&app, Some(("admin", "nope")), "listAll", json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorCode"], json!("INVALID_CREDENTIALS"));
}

#[tokio::test]
async fn test_unknown_operation_is_denied() {
    let (app, _db) = app().await;
    let (status, body, _) = call(&app, Some(ADMIN), "dropAllItems", json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorCode"], json!("FORBIDDEN"));
}

#[tokio::test]
async fn test_malformed_body() {
    let (app, _db) = app().await;
    let request = Request::builder()
        .method("POST")
        .uri(PATH)
        .header(header::AUTHORIZATION, basic_header(ADMIN.0, ADMIN.1))
        .body(Body::from("not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["errorCode"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _db) = app().await;
    let request = Request::builder()
        .method("GET")
        .uri(PATH)
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_catalog_needs_no_auth() {
    let (app, _db) = app().await;
    let request = Request::builder()
        .method("GET")
        .uri(PATH)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let operations = body["operations"].as_array().unwrap();
    assert_eq!(operations.len(), 17);
    let insert = operations
        .iter()
        .find(|op| op["name"] == json!("insertItem"))
        .unwrap();
    assert_eq!(insert["requiredRole"], json!("ADMIN"));
}

#[tokio::test]
async fn test_health_check() {
    let (app, _db) = app().await;
    let (_, body, _) = call(&app, Some(READER), "healthCheck", json!({})).await;
    assert_eq!(body["successful"], json!(true));
    assert_eq!(body["message"], json!("service operational - database connected"));
    assert_eq!(body["payload"]["type"], json!("health"));
}

#[tokio::test]
async fn test_change_password() {
    let (app, _db) = app().await;
    let (_, body, _) = call(
        &app,
        Some(READER),
        "changePassword",
        json!({"currentPassword": READER.1, "newPassword": "Otra#Clave77"}),
    )
    .await;
    assert_eq!(body["successful"], json!(true), "{body}");

    let (status, _, _) = call(&app, Some(READER), "listAll", json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = call(&app, Some(("consulta", "Otra#Clave77")), "listAll", json!({})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_set_stock_and_reference_lists() {
    let (app, _db) = app().await;
    let id = register_hammer(&app).await;

    let (_, body, _) = call(&app, Some(OPERATOR), "setStock", json!({"id": id, "newStock": "9"})).await;
    assert_eq!(body["message"], json!("Stock set successfully"));
    let (_, body, _) = call(&app, Some(OPERATOR), "setStock", json!({"id": id, "newStock": 9})).await;
    assert_eq!(body["message"], json!("Stock unchanged"));

    let (_, body, _) = call(&app, Some(READER), "listMovements", json!({"itemId": id})).await;
    assert_eq!(body["payload"]["data"][0]["kind"], json!("ADJUSTMENT"));

    let (_, body, _) = call(&app, Some(READER), "listCategories", json!({})).await;
    assert_eq!(body["message"], json!("6 categories"));
    let (_, body, _) = call(&app, Some(READER), "listSuppliers", json!({})).await;
    assert_eq!(body["message"], json!("3 suppliers"));
}

#[tokio::test]
async fn test_huge_stock_is_refused_and_listings_survive() {
    let (app, _db) = app().await;
    let (_, body, _) = call(
        &app,
        Some(ADMIN),
        "insertItem",
        json!({
            "code": "CARO1",
            "name": "Compresor industrial",
            "purchasePrice": "999990.00",
            "salePrice": "999999.99",
            "currentStock": 1,
            "minStock": 0
        }),
    )
    .await;
    let id = body["payload"]["data"]["id"].as_i64().unwrap();

    let (status, body, _) = call(
        &app,
        Some(OPERATOR),
        "setStock",
        json!({"id": id, "newStock": 1_000_000_000_000i64}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errorCode"], json!("VALIDATION_ERROR"));

    let (_, body, _) = call(
        &app,
        Some(OPERATOR),
        "setStock",
        json!({"id": id, "newStock": 2_147_483_647i64}),
    )
    .await;
    assert_eq!(body["successful"], json!(true), "{body}");

    let (_, body, _) = call(&app, Some(READER), "listAll", json!({})).await;
    assert_eq!(body["successful"], json!(true), "{body}");
    let value = &body["payload"]["data"][0]["inventoryValue"];
    assert_eq!(value, &json!("2147462172163530.00"));
}
