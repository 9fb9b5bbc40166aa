use crate::tests::utils::{TestApp, TODAY};
use serde_json::json;

#[test]
fn munferit_is_listed_first_and_protected() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    app.agency(&owner.token, "Anatolia Tours");
    let munferit = app.munferit_id(&owner.token);

    let caris = app.get("/cari-accounts", &owner.token).json();
    assert_eq!(caris[0]["name"], "Münferit");
    assert_eq!(caris[1]["name"], "Anatolia Tours");

    let edit = app.put(&format!("/cari-accounts/{munferit}"), &owner.token, json!({ "notes": "x" }));
    assert_eq!(edit.status, 409);
    assert_eq!(app.delete(&format!("/cari-accounts/{munferit}"), &owner.token).status, 409);
}

#[test]
fn create_update_search_and_delete() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");

    let blank = app.post("/cari-accounts", &owner.token, json!({ "name": "  " }));
    assert_eq!(blank.status, 422);

    let id = app.agency(&owner.token, "Sunset Travel");
    let updated = app.put(
        &format!("/cari-accounts/{id}"),
        &owner.token,
        json!({ "authorized_person": "Mehmet Kaya", "phone": "+90 555 000 0000" }),
    );
    assert_eq!(updated.status, 200);
    assert_eq!(updated.json()["authorized_person"], "Mehmet Kaya");
    assert_eq!(updated.json()["name"], "Sunset Travel");

    let found = app.get("/cari-accounts?search=sunset", &owner.token).json();
    assert_eq!(found.as_array().unwrap().len(), 1);

    assert_eq!(app.delete(&format!("/cari-accounts/{id}"), &owner.token).status, 200);
    assert_eq!(app.get(&format!("/cari-accounts/{id}"), &owner.token).status, 404);
}

#[test]
fn cari_with_reservations_cannot_be_deleted() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let id = app.agency(&owner.token, "Sunset Travel");
    app.book(&owner.token, json!({ "cari_id": id, "date": TODAY, "time": "10:00" }));
    assert_eq!(app.delete(&format!("/cari-accounts/{id}"), &owner.token).status, 409);
}

#[test]
fn detail_carries_ledger_and_bookings() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let id = app.agency(&owner.token, "Sunset Travel");
    app.book(&owner.token, json!({ "cari_id": id, "date": TODAY, "time": "10:00", "price": 90 }));

    let detail = app.cari(&owner.token, id);
    assert_eq!(detail["name"], "Sunset Travel");
    assert_eq!(detail["reservations"].as_array().unwrap().len(), 1);
    assert_eq!(detail["transactions"].as_array().unwrap().len(), 1);
}

#[test]
fn new_cari_inherits_flagged_seasonal_prices() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let season = app.post(
        "/seasonal-prices",
        &owner.token,
        json!({
            "start_date": "2025-06-01",
            "end_date": "2025-08-31",
            "price": 50,
            "apply_to_new_caris": true
        }),
    );
    assert_eq!(season.status, 201);

    let id = app.agency(&owner.token, "Sunset Travel");
    let prices = app.get("/seasonal-prices", &owner.token).json();
    let overrides = prices[0]["cari_prices"].as_array().unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0]["cari_id"], id);
    assert_eq!(overrides[0]["price"], 50.0);
}

#[test]
fn statement_downloads_as_xlsx() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let id = app.agency(&owner.token, "Sunset Travel");
    app.book(&owner.token, json!({ "cari_id": id, "date": TODAY, "time": "10:00", "price": 90 }));

    let reply = app.get(&format!("/cari-accounts/{id}/statement.xlsx"), &owner.token);
    assert_eq!(reply.status, 200);
    assert!(reply.bytes.starts_with(b"PK"));
    assert_eq!(
        reply.content_type.as_deref(),
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
    );
}

#[test]
fn cari_users_see_only_their_account() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let mine = app.agency(&owner.token, "Sunset Travel");
    let partner = app.user(&owner, "sunset", json!({ "role": "cari", "cari_id": mine }));
    assert_eq!(app.get("/cari-accounts", &partner).status, 403);
}
