//! Router tests driven through `tower::ServiceExt::oneshot` against an
//! in-memory database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use resto_core::{Role, User};
use resto_db::password::hash_password;
use resto_db::{Database, DbConfig};
use resto_server::{build_router, AppConfig, AppState};

const PASSWORD: &str = "motdepasse";

struct TestApp {
    app: Router,
    db: Database,
}

async fn setup() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = AppConfig::defaults().unwrap();
    let app = build_router(AppState::new(db.clone(), config));
    TestApp { app, db }
}

async fn add_user(db: &Database, email: &str, role: Role, active: bool) -> User {
    let now = Utc::now();
    db.users()
        .insert(&User {
            id: Uuid::new_v4().to_string(),
            name: format!("Test {}", role.as_str()),
            email: email.to_string(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role,
            is_active: active,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    set_cookie: Option<String>,
    body: Value,
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Reply {
    dispatch(app, request(method, uri, cookie, body)).await
}

async fn dispatch(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let cookie = set_cookie
        .as_deref()
        .and_then(|c| c.split(';').next())
        .map(str::to_string);

    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    Reply {
        status,
        cookie,
        set_cookie,
        body,
    }
}

async fn login(app: &Router, email: &str) -> String {
    let reply = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    reply.cookie.unwrap()
}

#[tokio::test]
async fn test_health() {
    let t = setup().await;
    let reply = send(&t.app, Method::GET, "/health", None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["database"], "connected");
}

#[tokio::test]
async fn test_api_requires_session() {
    let t = setup().await;
    let reply = send(&t.app, Method::GET, "/api/shared", None, None).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "UNAUTHENTICATED");
    assert_eq!(reply.body["message"], "Veuillez vous connecter pour continuer.");

    let reply = send(
        &t.app,
        Method::GET,
        "/api/shared",
        Some("resto_session=not-a-token"),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_http_only_cookie_and_shared_data() {
    let t = setup().await;
    add_user(&t.db, "caisse@resto.cd", Role::Caissier, true).await;

    let reply = send(
        &t.app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "CAISSE@resto.cd", "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["roleLabel"], "Caissier");
    let set_cookie = reply.set_cookie.unwrap();
    assert!(set_cookie.starts_with("resto_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = reply.cookie.unwrap();
    let shared = send(&t.app, Method::GET, "/api/shared", Some(&cookie), None).await;
    assert_eq!(shared.status, StatusCode::OK);
    assert_eq!(shared.body["user"]["email"], "caisse@resto.cd");
    assert_eq!(
        shared.body["customization"]["storageKey"],
        "restaurant_typography"
    );
    assert_eq!(shared.body["restaurant"]["exchangeRate"], 2500);

    let hrefs: Vec<&str> = shared.body["navigation"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["href"].as_str().unwrap())
        .collect();
    assert!(hrefs.contains(&"/sales"));
    assert!(!hrefs.contains(&"/users"));
}

#[tokio::test]
async fn test_failed_logins_are_throttled() {
    let t = setup().await;
    add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;
    let wrong = json!({ "email": "admin@resto.cd", "password": "mauvais-mdp" });

    for _ in 0..5 {
        let reply = send(&t.app, Method::POST, "/login", None, Some(wrong.clone())).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            reply.body["message"],
            "Ces identifiants ne correspondent pas à nos enregistrements."
        );
    }

    // locked even with the right password
    let reply = send(
        &t.app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "admin@resto.cd", "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    let message = reply.body["message"].as_str().unwrap();
    assert!(message.starts_with("Trop de tentatives de connexion."));
    assert!(message.ends_with("secondes."));
}

#[tokio::test]
async fn test_forwarded_header_does_not_reset_throttle() {
    let t = setup().await;
    add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;

    let mut statuses = Vec::new();
    for i in 0..8 {
        let mut req = request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "admin@resto.cd", "password": "mauvais-mdp" })),
        );
        req.headers_mut().insert(
            "x-forwarded-for",
            format!("10.0.0.{}", i).parse().unwrap(),
        );
        statuses.push(dispatch(&t.app, req).await.status);
    }

    assert!(statuses[..5].iter().all(|s| *s == StatusCode::UNAUTHORIZED));
    assert!(statuses[5..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_inactive_account_cannot_log_in() {
    let t = setup().await;
    add_user(&t.db, "ancien@resto.cd", Role::Caissier, false).await;

    let reply = send(
        &t.app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "ancien@resto.cd", "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let t = setup().await;
    add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;
    let cookie = login(&t.app, "admin@resto.cd").await;

    let reply = send(&t.app, Method::POST, "/logout", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Vous avez été déconnecté.");

    let reply = send(&t.app, Method::GET, "/api/dashboard", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stock_manager_creates_product_and_cashier_sells_it() {
    let t = setup().await;
    add_user(&t.db, "stock@resto.cd", Role::GestionnaireStock, true).await;
    add_user(&t.db, "caisse@resto.cd", Role::Caissier, true).await;
    let stock = login(&t.app, "stock@resto.cd").await;
    let caisse = login(&t.app, "caisse@resto.cd").await;

    let product = json!({
        "name": "Primus 72cl",
        "code": "PRIMUS-72",
        "category": "Bières",
        "bottlesPerCrate": 12,
        "glassesPerBottle": 3,
        "stock": { "crates": 2, "bottles": 0, "glasses": 0 },
        "minStock": 5,
        "priceCrateFc": 28000,
        "priceBottleFc": 2500
    });

    let reply = send(&t.app, Method::POST, "/api/products", Some(&caisse), Some(product.clone())).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(&t.app, Method::POST, "/api/products", Some(&stock), Some(product)).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["prices"]["bottleUsd"], 100);
    let product_id = reply.body["id"].as_str().unwrap().to_string();

    let sale = json!({
        "lines": [{ "productId": product_id, "unit": "bouteille", "quantity": 2 }],
        "tender": { "paidFc": 10000 },
        "paymentMode": "fc"
    });

    let reply = send(&t.app, Method::POST, "/api/sales", Some(&stock), Some(sale.clone())).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(&t.app, Method::POST, "/api/sales", Some(&caisse), Some(sale)).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["montantTotalFc"], 5000);
    assert_eq!(reply.body["renduFc"], 5000);
    assert_eq!(reply.body["montantTotalUsd"], 200);
    assert_eq!(reply.body["items"].as_array().unwrap().len(), 1);
    let sale_id = reply.body["id"].as_str().unwrap().to_string();

    let reply = send(
        &t.app,
        Method::POST,
        &format!("/api/sales/{}/printed", sale_id),
        Some(&caisse),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = send(&t.app, Method::GET, &format!("/api/sales/{}", sale_id), Some(&caisse), None).await;
    assert_eq!(reply.body["isPrinted"], true);

    let reply = send(
        &t.app,
        Method::GET,
        &format!("/api/products/{}", product_id),
        Some(&caisse),
        None,
    )
    .await;
    assert_eq!(reply.body["totalBottles"], 22);
}

#[tokio::test]
async fn test_underpaid_sale_is_rejected() {
    let t = setup().await;
    let admin = add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;
    let cookie = login(&t.app, &admin.email).await;

    let reply = send(
        &t.app,
        Method::POST,
        "/api/products",
        Some(&cookie),
        Some(json!({
            "name": "Fanta",
            "code": "FANTA",
            "category": "Sucrés",
            "stock": { "crates": 0, "bottles": 10, "glasses": 0 },
            "priceBottleFc": 1500
        })),
    )
    .await;
    let product_id = reply.body["id"].as_str().unwrap().to_string();

    let reply = send(
        &t.app,
        Method::POST,
        "/api/sales",
        Some(&cookie),
        Some(json!({
            "lines": [{ "productId": product_id, "unit": "bouteille", "quantity": 2 }],
            "tender": { "paidFc": 1000 }
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.body["code"], "PAYMENT_ERROR");

    for tender in [
        json!({ "paidUsd": i64::MAX / 10 }),
        json!({ "paidFc": i64::MAX, "paidUsd": 100 }),
    ] {
        let reply = send(
            &t.app,
            Method::POST,
            "/api/sales",
            Some(&cookie),
            Some(json!({
                "lines": [{ "productId": product_id, "unit": "bouteille", "quantity": 1 }],
                "tender": tender,
                "paymentMode": "mixte"
            })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", reply.body);
        assert_eq!(reply.body["code"], "PAYMENT_ERROR");
    }

    let reply = send(
        &t.app,
        Method::POST,
        &format!("/api/products/{}/stock", product_id),
        Some(&cookie),
        Some(json!({ "crates": i64::MAX, "bottles": 0, "glasses": 0 })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "VALIDATION_ERROR");

    let reply = send(&t.app, Method::GET, &format!("/api/products/{}", product_id), Some(&cookie), None).await;
    assert_eq!(reply.body["stockBottles"], 10);
}

#[tokio::test]
async fn test_user_creation_respects_plan_limit() {
    let t = setup().await;
    add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;
    let cookie = login(&t.app, "admin@resto.cd").await;

    let reply = send(
        &t.app,
        Method::POST,
        "/api/users",
        Some(&cookie),
        Some(json!({
            "name": "Jean Caisse",
            "email": "jean@resto.cd",
            "password": "unmotdepasse",
            "role": "caissier"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert!(reply.body.get("passwordHash").is_none());

    // the free plan allows two accounts
    let reply = send(
        &t.app,
        Method::POST,
        "/api/users",
        Some(&cookie),
        Some(json!({
            "name": "Paul Stock",
            "email": "paul@resto.cd",
            "password": "unmotdepasse",
            "role": "gestionnaire_stock"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(reply.body["code"], "SUBSCRIPTION_LIMIT");
}

#[tokio::test]
async fn test_last_admin_cannot_be_demoted() {
    let t = setup().await;
    let admin = add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;
    let cookie = login(&t.app, &admin.email).await;

    let reply = send(
        &t.app,
        Method::PUT,
        &format!("/api/users/{}/role", admin.id),
        Some(&cookie),
        Some(json!({ "role": "caissier" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = send(
        &t.app,
        Method::POST,
        &format!("/api/users/{}/deactivate", admin.id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_reactivation_respects_plan_limit() {
    let t = setup().await;
    add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;
    let cookie = login(&t.app, "admin@resto.cd").await;

    let product = |code: &str| {
        json!({
            "name": format!("Produit {}", code),
            "code": code,
            "category": "Bières",
            "priceBottleFc": 2000
        })
    };

    let reply = send(&t.app, Method::POST, "/api/products", Some(&cookie), Some(product("RETIRED"))).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    let retired_id = reply.body["id"].as_str().unwrap().to_string();

    let reply = send(
        &t.app,
        Method::DELETE,
        &format!("/api/products/{}", retired_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    // the free plan allows fifty active products
    for i in 0..50 {
        let reply = send(
            &t.app,
            Method::POST,
            "/api/products",
            Some(&cookie),
            Some(product(&format!("P{}", i))),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    }

    let mut revived = product("RETIRED");
    revived["isActive"] = json!(true);
    let reply = send(
        &t.app,
        Method::PUT,
        &format!("/api/products/{}", retired_id),
        Some(&cookie),
        Some(revived),
    )
    .await;
    assert_eq!(reply.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(reply.body["code"], "SUBSCRIPTION_LIMIT");

    let mut still_retired = product("RETIRED");
    still_retired["isActive"] = json!(false);
    let reply = send(
        &t.app,
        Method::PUT,
        &format!("/api/products/{}", retired_id),
        Some(&cookie),
        Some(still_retired),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["isActive"], false);
}

#[tokio::test]
async fn test_typography_round_trip_and_admin_guard() {
    let t = setup().await;
    add_user(&t.db, "admin@resto.cd", Role::Admin, true).await;
    add_user(&t.db, "caisse@resto.cd", Role::Caissier, true).await;
    let admin = login(&t.app, "admin@resto.cd").await;
    let caisse = login(&t.app, "caisse@resto.cd").await;

    let layer = json!({ "fontSize": "large" });

    let reply = send(&t.app, Method::PUT, "/api/settings/typography", Some(&caisse), Some(layer.clone())).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(&t.app, Method::PUT, "/api/settings/typography", Some(&admin), Some(layer)).await;
    assert_eq!(reply.status, StatusCode::OK);

    let shared = send(&t.app, Method::GET, "/api/shared", Some(&caisse), None).await;
    let resolved = &shared.body["customization"]["resolved"];
    assert_eq!(resolved["fontSize"], "large");
    assert_eq!(resolved["fontFamily"], "Instrument Sans");
}
