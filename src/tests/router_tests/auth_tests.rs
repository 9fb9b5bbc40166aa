use crate::tests::utils::TestApp;
use http::Method;
use serde_json::json;

#[test]
fn register_then_login_by_company_code() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    assert_eq!(owner.company_code, "1000");

    let reply = app.call(
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({
            "company_code": owner.company_code,
            "username": "owner",
            "password": "correct-horse"
        })),
    );
    assert_eq!(reply.status, 200);
    let body = reply.json();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["role"], "owner");
    assert!(body["user"].get("password_hash").is_none());
}

#[test]
fn wrong_password_is_unauthorized() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let reply = app.call(
        Method::POST,
        "/auth/login",
        None,
        Some(json!({
            "company_code": owner.company_code,
            "username": "owner",
            "password": "wrong-horse"
        })),
    );
    assert_eq!(reply.status, 401);
    assert_eq!(reply.json()["detail"], "invalid credentials");
}

#[test]
fn registration_validates_every_field_at_once() {
    let app = TestApp::new();
    let reply = app.call(
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "username": "owner", "password": "short" })),
    );
    assert_eq!(reply.status, 422);
    let fields: Vec<String> = reply.json()["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["loc"][1].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["company_name", "password"]);
}

#[test]
fn me_reports_permissions_and_logout_revokes() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");

    let me = app.get("/auth/me", &owner.token).json();
    assert_eq!(me["is_admin"], true);
    assert_eq!(me["company"]["company_name"], "Cappadocia ATV");

    assert_eq!(app.post("/auth/logout", &owner.token, json!({})).status, 200);
    assert_eq!(app.get("/auth/me", &owner.token).status, 401);
}

#[test]
fn missing_token_is_unauthorized() {
    let app = TestApp::new();
    let reply = app.call(Method::GET, "/reservations", None, None);
    assert_eq!(reply.status, 401);
}

#[test]
fn staff_only_hold_granted_permissions() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let staff = app.user(
        &owner,
        "desk",
        json!({
            "role": "staff",
            "permissions": [{ "module": "reservations", "action": "view" }]
        }),
    );

    assert_eq!(app.get("/reservations", &staff).status, 200);
    let reply = app.post(
        "/reservations",
        &staff,
        json!({ "date": "2025-06-01", "time": "10:00" }),
    );
    assert_eq!(reply.status, 403);
    assert_eq!(app.get("/reports/earnings", &staff).status, 403);
}

#[test]
fn companies_are_isolated() {
    let app = TestApp::new();
    let first = app.register("First Tours");
    let second = app.register("Second Tours");
    assert_eq!(second.company_code, "1001");

    let r = app.book(&first.token, json!({ "date": "2025-06-01", "time": "10:00" }));
    let id = r["id"].as_i64().unwrap();

    assert_eq!(app.get(&format!("/reservations/{id}"), &second.token).status, 404);
    assert_eq!(app.get("/reservations", &second.token).json(), json!([]));
}
