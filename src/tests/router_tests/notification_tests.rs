use crate::tests::utils::{TestApp, TODAY};
use serde_json::json;

#[test]
fn tour_start_is_raised_once() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let soon = app.book(
        &owner.token,
        json!({ "date": TODAY, "time": "10:00", "atv_count": 3, "customer_name": "Ayşe Demir" }),
    );
    app.book(&owner.token, json!({ "date": TODAY, "time": "12:00" }));

    let first = app.get("/notifications", &owner.token).json();
    let items = first.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "tour_start");
    assert_eq!(items[0]["entity_id"], soon["id"]);
    assert_eq!(items[0]["message"], "10:00 - Ayşe Demir (3 ATV)");
    assert_eq!(items[0]["is_read"], false);

    let again = app.get("/notifications", &owner.token).json();
    assert_eq!(again.as_array().unwrap().len(), 1);
}

#[test]
fn mark_read_and_unread_filter() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    app.book(&owner.token, json!({ "date": TODAY, "time": "10:00" }));
    app.book(&owner.token, json!({ "date": TODAY, "time": "10:10" }));

    let all = app.get("/notifications", &owner.token).json();
    assert_eq!(all.as_array().unwrap().len(), 2);
    let first_id = all[0]["id"].clone();

    let marked = app.post("/notifications/mark-read", &owner.token, json!({ "ids": [first_id] }));
    assert_eq!(marked.json()["updated"], 1);
    let unread = app.get("/notifications?unread_only=true", &owner.token).json();
    assert_eq!(unread.as_array().unwrap().len(), 1);

    let rest = app.post("/notifications/mark-read", &owner.token, json!({}));
    assert_eq!(rest.status, 200);
    let unread = app.get("/notifications?unread_only=true", &owner.token).json();
    assert!(unread.as_array().unwrap().is_empty());
}

#[test]
fn batch_delete_and_validation() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    app.book(&owner.token, json!({ "date": TODAY, "time": "10:00" }));
    let all = app.get("/notifications", &owner.token).json();
    let id = all[0]["id"].clone();

    let invalid = app.post("/notifications/batch", &owner.token, json!({ "ids": [] }));
    assert_eq!(invalid.status, 422);
    let fields: Vec<String> = invalid.json()["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["loc"][1].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["action", "ids"]);

    let deleted = app.post(
        "/notifications/batch",
        &owner.token,
        json!({ "action": "delete", "ids": [id] }),
    );
    assert_eq!(deleted.json()["affected"], 1);
}

#[test]
fn pending_booking_notifies_the_company() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let cari = app.agency(&owner.token, "Sunset Travel");
    let partner = app.user(&owner, "sunset", json!({ "role": "cari", "cari_id": cari }));
    app.book(&partner, json!({ "date": "2025-06-05", "time": "10:00" }));

    let items = app.get("/notifications", &owner.token).json();
    assert_eq!(items[0]["type"], "pending_reservation");
    assert_eq!(items[0]["entity_type"], "reservation");
}
