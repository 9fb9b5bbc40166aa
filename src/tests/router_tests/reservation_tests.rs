use crate::tests::utils::{TestApp, TODAY};
use serde_json::json;

#[test]
fn agency_booking_is_confirmed_and_debits_the_agency() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");

    let r = app.book(
        &owner.token,
        json!({
            "cari_id": agency,
            "date": "2025-06-02",
            "time": "10:00",
            "customer_name": "Ayşe Demir",
            "vehicle_count": 2,
            "price": 120,
            "currency": "EUR"
        }),
    );
    assert_eq!(r["status"], "confirmed");
    assert_eq!(r["atv_count"], 2);
    assert_eq!(r["pickup_location"], "Side Harbour");
    assert_eq!(r["payment_badge"], serde_json::Value::Null);
    let voucher = r["voucher_code"].as_str().unwrap();
    assert!(voucher.starts_with("VCHR-20250601-"), "{voucher}");
    assert_eq!(voucher.len(), "VCHR-20250601-".len() + 6);

    let cari = app.cari(&owner.token, agency);
    assert_eq!(cari["balance_eur"], 120.0);
    assert_eq!(cari["transactions"][0]["transaction_type"], "debit");
    assert_eq!(cari["transactions"][0]["reference_id"], r["id"]);
}

#[test]
fn missing_cari_books_against_munferit() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let munferit = app.munferit_id(&owner.token);

    let r = app.book(&owner.token, json!({ "date": TODAY, "time": "11:00", "price": 50 }));
    assert_eq!(r["cari_id"], munferit);
    assert_eq!(r["is_munferit"], true);
    assert_eq!(r["has_payment"], false);
    assert_eq!(r["payment_badge"], "not_received");
    assert_eq!(r["payment_badge_label"], "Alınmadı");
}

#[test]
fn date_and_time_are_required() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let reply = app.post("/reservations", &owner.token, json!({ "time": "25:00" }));
    assert_eq!(reply.status, 422);
    let body = reply.json();
    let fields: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["loc"][1].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"date"));
    assert!(fields.contains(&"time"));
}

#[test]
fn unknown_cari_is_a_validation_error() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let reply = app.post(
        "/reservations",
        &owner.token,
        json!({ "cari_id": 999, "date": TODAY, "time": "10:00" }),
    );
    assert_eq!(reply.status, 422);
    assert_eq!(reply.json()["detail"][0]["msg"], "unknown cari account");
}

#[test]
fn price_edit_reposts_the_debit() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let r = app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": TODAY, "time": "10:00", "price": 100 }),
    );
    let id = r["id"].as_i64().unwrap();

    let reply = app.put(
        &format!("/reservations/{id}"),
        &owner.token,
        json!({ "price": 80, "currency": "USD" }),
    );
    assert_eq!(reply.status, 200);
    let updated = reply.json();
    assert_eq!(updated["time"], "10:00");
    assert_eq!(updated["currency"], "USD");
    assert_eq!(updated["exchange_rate"], 1.1);

    let cari = app.cari(&owner.token, agency);
    assert_eq!(cari["balance_eur"], 0.0);
    assert_eq!(cari["balance_usd"], 80.0);
    assert_eq!(cari["transactions"].as_array().unwrap().len(), 1);
}

#[test]
fn edit_cannot_blank_date_or_time() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let r = app.book(&owner.token, json!({ "date": TODAY, "time": "10:00" }));
    let id = r["id"].as_i64().unwrap();

    let reply = app.put(
        &format!("/reservations/{id}"),
        &owner.token,
        json!({ "date": "", "time": "  " }),
    );
    assert_eq!(reply.status, 422);
    let body = reply.json();
    let fields: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["loc"][1].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["date", "time"]);

    let stored = app.get(&format!("/reservations/{id}"), &owner.token).json();
    assert_eq!(stored["date"], TODAY);
    assert_eq!(stored["time"], "10:00");
}

#[test]
fn cancel_with_no_show_replaces_debit_with_penalty() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let r = app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": TODAY, "time": "10:00", "price": 100 }),
    );
    let id = r["id"].as_i64().unwrap();

    let reply = app.put(
        &format!("/reservations/{id}/cancel"),
        &owner.token,
        json!({
            "reason": "did not show up",
            "apply_no_show": true,
            "no_show_amount": 30,
            "no_show_currency": "EUR",
            "exchange_rate": 1.0
        }),
    );
    assert_eq!(reply.status, 200);
    let cancelled = reply.json();
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["no_show_applied"], true);
    assert_eq!(cancelled["cancel_reason"], "did not show up");

    let cari = app.cari(&owner.token, agency);
    assert_eq!(cari["balance_eur"], 30.0);

    let again = app.put(&format!("/reservations/{id}/cancel"), &owner.token, json!({}));
    assert_eq!(again.status, 409);
}

#[test]
fn no_show_without_rate_uses_current_rates() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let r = app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": TODAY, "time": "10:00", "price": 100 }),
    );

    let reply = app.put(
        &format!("/reservations/{}/cancel", r["id"]),
        &owner.token,
        json!({ "apply_no_show": true, "no_show_amount": 50, "no_show_currency": "TRY" }),
    );
    assert_eq!(reply.status, 200, "{}", reply.text());

    let cari = app.cari(&owner.token, agency);
    assert_eq!(cari["balance_try"], 50.0);
    let penalty = &cari["transactions"][0];
    assert_eq!(penalty["currency"], "TRY");
    assert_eq!(penalty["exchange_rate"], 35.0);
}

#[test]
fn no_show_needs_an_amount() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let r = app.book(&owner.token, json!({ "date": TODAY, "time": "10:00" }));
    let reply = app.put(
        &format!("/reservations/{}/cancel", r["id"]),
        &owner.token,
        json!({ "apply_no_show": true }),
    );
    assert_eq!(reply.status, 422);
}

#[test]
fn complete_only_from_confirmed() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let r = app.book(&owner.token, json!({ "date": TODAY, "time": "10:00" }));
    let id = r["id"].as_i64().unwrap();

    let done = app.post(&format!("/reservations/{id}/complete"), &owner.token, json!({}));
    assert_eq!(done.status, 200);
    assert_eq!(done.json()["status"], "completed");

    let edit = app.put(&format!("/reservations/{id}"), &owner.token, json!({ "price": 5 }));
    assert_eq!(edit.status, 409);
    let cancel = app.put(&format!("/reservations/{id}/cancel"), &owner.token, json!({}));
    assert_eq!(cancel.status, 409);
}

#[test]
fn delete_reverts_the_ledger() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let r = app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": TODAY, "time": "10:00", "price": 100 }),
    );
    let id = r["id"].as_i64().unwrap();

    assert_eq!(app.delete(&format!("/reservations/{id}"), &owner.token).status, 200);
    assert_eq!(app.get(&format!("/reservations/{id}"), &owner.token).status, 404);
    let cari = app.cari(&owner.token, agency);
    assert_eq!(cari["balance_eur"], 0.0);
    assert_eq!(cari["transactions"], json!([]));
}

#[test]
fn cari_user_requests_wait_for_approval() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let other = app.agency(&owner.token, "Moon Travel");
    let partner = app.user(&owner, "sunset", json!({ "role": "cari", "cari_id": agency }));

    let r = app.book(
        &partner,
        json!({ "cari_id": other, "date": "2025-06-03", "time": "09:00", "customer_name": "Jan Novak" }),
    );
    assert_eq!(r["status"], "pending");
    assert_eq!(r["cari_id"], agency);
    let id = r["id"].as_i64().unwrap();

    let queue = app.get("/reservations/pending", &owner.token).json();
    assert_eq!(queue.as_array().unwrap().len(), 1);
    let notes = app.get("/notifications?unread_only=true", &owner.token).json();
    assert_eq!(notes[0]["type"], "pending_reservation");
    assert_eq!(notes[0]["entity_id"], id);

    let missing = app.post(&format!("/reservations/{id}/approve"), &owner.token, json!({}));
    assert_eq!(missing.status, 422);
    assert_eq!(missing.json()["detail"][0]["loc"][1], "pickup_time");

    let approved = app.post(
        &format!("/reservations/{id}/approve"),
        &owner.token,
        json!({ "pickup_time": "08:30" }),
    );
    assert_eq!(approved.status, 200);
    assert_eq!(approved.json()["status"], "confirmed");
    assert_eq!(approved.json()["pickup_time"], "08:30");

    // Partners cannot touch other accounts' bookings.
    let foreign = app.book(&owner.token, json!({ "cari_id": other, "date": TODAY, "time": "12:00" }));
    let reply = app.get(&format!("/reservations/{}", foreign["id"]), &partner);
    assert_eq!(reply.status, 404);
    assert_eq!(app.get("/reservations", &partner).json().as_array().unwrap().len(), 1);
}

#[test]
fn reject_cancels_a_pending_request() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let partner = app.user(&owner, "sunset", json!({ "role": "cari", "cari_id": agency }));
    let r = app.book(&partner, json!({ "date": "2025-06-03", "time": "09:00", "price": 40 }));
    let id = r["id"].as_i64().unwrap();

    let reply = app.post(
        &format!("/reservations/{id}/reject"),
        &owner.token,
        json!({ "reason": "fully booked" }),
    );
    assert_eq!(reply.status, 200);
    assert_eq!(reply.json()["status"], "cancelled");
    assert_eq!(app.cari(&owner.token, agency)["balance_eur"], 0.0);

    let twice = app.post(&format!("/reservations/{id}/reject"), &owner.token, json!({}));
    assert_eq!(twice.status, 409);
}

#[test]
fn voucher_renders_the_ticket() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let r = app.book(
        &owner.token,
        json!({ "date": TODAY, "time": "10:00", "customer_name": "Ayşe Demir" }),
    );
    let reply = app.get(&format!("/reservations/{}/voucher", r["id"]), &owner.token);
    assert_eq!(reply.status, 200);
    let html = reply.text();
    assert!(html.contains(r["voucher_code"].as_str().unwrap()));
    assert!(html.contains("Cappadocia ATV"));
    assert!(html.contains("Ayşe Demir"));
}

#[test]
fn list_filters_by_status_and_search() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    app.book(&owner.token, json!({ "date": TODAY, "time": "10:00", "customer_name": "Ayşe Demir" }));
    let other = app.book(&owner.token, json!({ "date": TODAY, "time": "12:00", "customer_name": "Jan Novak" }));
    app.post(&format!("/reservations/{}/complete", other["id"]), &owner.token, json!({}));

    let found = app.get("/reservations?search=novak", &owner.token).json();
    assert_eq!(found.as_array().unwrap().len(), 1);
    let confirmed = app.get("/reservations?status=confirmed", &owner.token).json();
    assert_eq!(confirmed[0]["customer_name"], "Ayşe Demir");
    assert_eq!(app.get("/reservations?status=bogus", &owner.token).status, 422);
}

#[test]
fn atomic_booking_links_payment_in_one_step() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let reply = app.post(
        "/bookings",
        &owner.token,
        json!({
            "date": TODAY,
            "time": "10:00",
            "price": 60,
            "payment": { "amount": 60, "currency": "EUR", "payment_kind": "cash" }
        }),
    );
    assert_eq!(reply.status, 201, "{}", reply.text());
    let body = reply.json();
    assert_eq!(body["reservation"]["has_payment"], true);
    assert_eq!(body["reservation"]["payment_badge"], "received");
    assert_eq!(body["transaction"]["reference_id"], body["reservation"]["id"]);
    assert_eq!(body["transaction"]["reference_type"], "reservation");

    let munferit = app.munferit_id(&owner.token);
    assert_eq!(app.cari(&owner.token, munferit)["balance_eur"], 0.0);
}

#[test]
fn atomic_booking_rejects_bad_payment_before_writing() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let reply = app.post(
        "/bookings",
        &owner.token,
        json!({
            "date": TODAY,
            "time": "10:00",
            "payment": { "amount": 60, "currency": "EUR", "payment_kind": "bank_transfer" }
        }),
    );
    assert_eq!(reply.status, 422);
    assert_eq!(reply.json()["detail"][0]["loc"][1], "bank_account_id");
    assert_eq!(app.get("/reservations", &owner.token).json(), json!([]));
}
