use crate::tests::utils::{TestApp, TODAY};
use serde_json::json;

#[test]
fn payment_lowers_the_agency_balance() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": TODAY, "time": "10:00", "price": 200 }),
    );

    let reply = app.post(
        "/transactions",
        &owner.token,
        json!({
            "cari_id": agency,
            "transaction_type": "payment",
            "amount": 150,
            "currency": "EUR",
            "payment_kind": "cash"
        }),
    );
    assert_eq!(reply.status, 201, "{}", reply.text());
    let t = reply.json();
    assert_eq!(t["date"], TODAY);
    assert_eq!(t["reference_id"], serde_json::Value::Null);

    assert_eq!(app.cari(&owner.token, agency)["balance_eur"], 50.0);

    assert_eq!(app.delete(&format!("/transactions/{}", t["id"]), &owner.token).status, 200);
    assert_eq!(app.cari(&owner.token, agency)["balance_eur"], 200.0);
}

#[test]
fn payment_kind_rules_are_enforced() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let munferit = app.munferit_id(&owner.token);

    let cheque = app.post(
        "/transactions",
        &owner.token,
        json!({
            "cari_id": munferit,
            "transaction_type": "payment",
            "amount": 100,
            "payment_kind": "check_promissory"
        }),
    );
    assert_eq!(cheque.status, 422);
    assert_eq!(cheque.json()["detail"][0]["loc"][1], "due_date");

    let transfer = app.post(
        "/transactions",
        &owner.token,
        json!({
            "cari_id": munferit,
            "transaction_type": "payment",
            "amount": 100,
            "payment_kind": "transfer_to_cari",
            "transfer_to_cari_id": 4242
        }),
    );
    assert_eq!(transfer.status, 422);
    assert_eq!(transfer.json()["detail"][0]["msg"], "unknown cari account");
}

#[test]
fn bank_transfer_needs_a_known_account() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let munferit = app.munferit_id(&owner.token);
    let bank = app.post(
        "/cash-accounts",
        &owner.token,
        json!({ "name": "Ziraat", "account_type": "bank", "iban": "TR00 0001", "currency": "TRY" }),
    );
    assert_eq!(bank.status, 201);
    let bank_id = bank.json()["id"].as_i64().unwrap();

    let body = |account: i64| {
        json!({
            "cari_id": munferit,
            "transaction_type": "payment",
            "amount": 3500,
            "currency": "TRY",
            "payment_kind": "bank_transfer",
            "bank_account_id": account,
            "exchange_rate": 35.0
        })
    };
    assert_eq!(app.post("/transactions", &owner.token, body(bank_id + 100)).status, 422);
    let ok = app.post("/transactions", &owner.token, body(bank_id));
    assert_eq!(ok.status, 201);
    assert_eq!(ok.json()["bank_account_id"], bank_id);
    assert_eq!(app.cari(&owner.token, munferit)["balance_try"], -3500.0);
}

#[test]
fn payment_is_linked_after_the_reservation_exists() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let munferit = app.munferit_id(&owner.token);

    let payment = app
        .post(
            "/transactions",
            &owner.token,
            json!({ "cari_id": munferit, "transaction_type": "payment", "amount": 60 }),
        )
        .json();
    let r = app.book(&owner.token, json!({ "date": TODAY, "time": "10:00", "price": 60 }));
    assert_eq!(r["has_payment"], false);

    let unknown = app.put(
        &format!("/transactions/{}", payment["id"]),
        &owner.token,
        json!({ "reference_id": 9999, "reference_type": "reservation" }),
    );
    assert_eq!(unknown.status, 422);

    let half = app.put(
        &format!("/transactions/{}", payment["id"]),
        &owner.token,
        json!({ "reference_id": r["id"] }),
    );
    assert_eq!(half.status, 422);

    let linked = app.put(
        &format!("/transactions/{}", payment["id"]),
        &owner.token,
        json!({ "reference_id": r["id"], "reference_type": "reservation" }),
    );
    assert_eq!(linked.status, 200);
    assert_eq!(linked.json()["reference_id"], r["id"]);

    let fetched = app.get(&format!("/reservations/{}", r["id"]), &owner.token).json();
    assert_eq!(fetched["has_payment"], true);
    assert_eq!(fetched["payment_badge"], "received");

    let entries = app
        .get(&format!("/transactions?reference_id={}&type=payment", r["id"]), &owner.token)
        .json();
    assert_eq!(entries.as_array().unwrap().len(), 1);
}

#[test]
fn linking_a_missing_transaction_is_not_found() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let reply = app.put("/transactions/77", &owner.token, json!({ "description": "x" }));
    assert_eq!(reply.status, 404);
}
