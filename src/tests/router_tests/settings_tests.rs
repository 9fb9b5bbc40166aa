use crate::tests::utils::TestApp;
use serde_json::json;

#[test]
fn default_payment_types_are_seeded() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let types = app.get("/payment-types", &owner.token).json();
    let names: Vec<&str> = types
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Nakit", "Havale / EFT", "Kredi Kartı", "Çek / Senet", "Cariye Aktar"]
    );
    assert_eq!(types[1]["kind"], "bank_transfer");

    let created = app.post(
        "/payment-types",
        &owner.token,
        json!({ "name": "Pos", "kind": "credit_card" }),
    );
    assert_eq!(created.status, 201);
    let id = created.json()["id"].clone();
    assert_eq!(app.delete(&format!("/payment-types/{id}"), &owner.token).status, 200);
    assert_eq!(app.delete(&format!("/payment-types/{id}"), &owner.token).status, 404);
}

#[test]
fn tour_types_validate_and_delete() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let bad = app.post(
        "/tour-types",
        &owner.token,
        json!({ "name": "Sunset", "color": "orange", "duration_hours": 0 }),
    );
    assert_eq!(bad.status, 422);
    assert_eq!(bad.json()["detail"].as_array().unwrap().len(), 2);

    let ok = app.post(
        "/tour-types",
        &owner.token,
        json!({ "name": "Sunset", "color": "#ff8800", "duration_hours": 1.5, "default_price": 45 }),
    );
    assert_eq!(ok.status, 201);
    let listed = app.get("/tour-types", &owner.token).json();
    assert_eq!(listed[0]["default_currency"], "EUR");
    assert_eq!(listed[0]["duration_hours"], 1.5);
}

#[test]
fn bank_accounts_need_an_iban() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let bad = app.post(
        "/cash-accounts",
        &owner.token,
        json!({ "name": "Garanti", "account_type": "bank" }),
    );
    assert_eq!(bad.status, 422);
    assert_eq!(bad.json()["detail"][0]["loc"][1], "iban");

    let till = app.post("/cash-accounts", &owner.token, json!({ "name": "Kasa" }));
    assert_eq!(till.status, 201);
    assert_eq!(till.json()["account_type"], "cash");
    assert_eq!(app.get("/cash-accounts", &owner.token).json().as_array().unwrap().len(), 1);
}

#[test]
fn seasonal_quote_prefers_cari_override() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let tour = app
        .post(
            "/tour-types",
            &owner.token,
            json!({ "name": "Canyon", "default_price": 30 }),
        )
        .json();

    let inverted = app.post(
        "/seasonal-prices",
        &owner.token,
        json!({ "start_date": "2025-09-01", "end_date": "2025-06-01", "price": 40 }),
    );
    assert_eq!(inverted.status, 422);

    let season = app.post(
        "/seasonal-prices",
        &owner.token,
        json!({
            "start_date": "2025-06-01",
            "end_date": "2025-08-31",
            "price": 40,
            "tour_type_ids": [tour["id"]],
            "cari_prices": [{ "cari_id": agency, "price": 35 }]
        }),
    );
    assert_eq!(season.status, 201);

    let base = format!("/seasonal-prices/quote?date=2025-07-01&tour_type_id={}&atv_count=3", tour["id"]);
    let plain = app.get(&base, &owner.token).json();
    assert_eq!(plain["source"], "seasonal");
    assert_eq!(plain["total"], 120.0);

    let special = app.get(&format!("{base}&cari_id={agency}"), &owner.token).json();
    assert_eq!(special["source"], "cari_override");
    assert_eq!(special["unit_price"], 35.0);

    let off_season = app
        .get(&format!("/seasonal-prices/quote?date=2025-10-01&tour_type_id={}", tour["id"]), &owner.token)
        .json();
    assert_eq!(off_season["source"], "tour_default");
    assert_eq!(off_season["total"], 30.0);

    assert_eq!(app.get("/seasonal-prices/quote?date=2025-10-01", &owner.token).status, 404);
    assert_eq!(app.get("/seasonal-prices/quote", &owner.token).status, 422);
}

#[test]
fn currency_rates_fall_back_then_store() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let before = app.get("/currency/rates", &owner.token).json();
    assert_eq!(before["source"], "fallback");
    assert_eq!(before["rates"]["USD"], 1.1);

    let bad = app.put("/currency/rates", &owner.token, json!({ "usd": 0 }));
    assert_eq!(bad.status, 422);

    let set = app.put("/currency/rates", &owner.token, json!({ "usd": 1.08, "try": 37.8 }));
    assert_eq!(set.status, 200);
    let after = app.get("/currency/rates", &owner.token).json();
    assert_eq!(after["source"], "stored");
    assert_eq!(after["rates"]["TRY"], 37.8);

    let header = app.get("/currency/rates/header", &owner.token).json();
    assert_eq!(header["eur_try"], 37.8);
    assert_eq!(header["usd_try"], 35.0);
}

#[test]
fn busy_hour_threshold_round_trip() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    assert_eq!(app.get("/busy-hour-threshold", &owner.token).json()["threshold"], 5);
    assert_eq!(app.put("/busy-hour-threshold", &owner.token, json!({ "threshold": 0 })).status, 422);
    assert_eq!(app.put("/busy-hour-threshold", &owner.token, json!({ "threshold": 8 })).status, 200);
    assert_eq!(app.get("/busy-hour-threshold", &owner.token).json()["threshold"], 8);
    assert_eq!(app.get("/dashboard", &owner.token).json()["busy_hour_threshold"], 8);
}

#[test]
fn company_profile_updates_are_partial() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let updated = app.put(
        "/company/profile",
        &owner.token,
        json!({ "phone": "+90 384 000 0000", "email": "info@example.com" }),
    );
    assert_eq!(updated.status, 200, "{}", updated.text());
    let profile = app.get("/company/profile", &owner.token).json();
    assert_eq!(profile["company_name"], "Cappadocia ATV");
    assert_eq!(profile["company_code"], owner.company_code);
    assert_eq!(profile["phone"], "+90 384 000 0000");

    let blank = app.put("/company/profile", &owner.token, json!({ "company_name": " " }));
    assert_eq!(blank.status, 422);
}

#[test]
fn staff_cannot_change_settings() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let staff = app.user(&owner, "desk", json!({ "role": "staff" }));
    assert_eq!(app.get("/tour-types", &staff).status, 200);
    assert_eq!(app.post("/tour-types", &staff, json!({ "name": "X" })).status, 403);
    assert_eq!(app.put("/busy-hour-threshold", &staff, json!({ "threshold": 3 })).status, 403);
}
