use crate::tests::utils::{TestApp, TODAY};
use serde_json::{json, Value};

fn total(report: &Value, key: &str, currency: &str) -> Value {
    report[key]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["currency"] == currency)
        .map(|t| t["amount"].clone())
        .unwrap_or(Value::Null)
}

struct Books {
    app: TestApp,
    token: String,
    agency: i64,
}

/// Two live bookings, one no-show, one cash payment and one credit.
fn seeded() -> Books {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let agency = app.agency(&owner.token, "Sunset Travel");
    let partner = app.agency(&owner.token, "Blue Voyage");

    app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": TODAY, "time": "10:00", "price": 100, "atv_count": 2 }),
    );
    app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": "2025-06-02", "time": "10:00", "price": 50, "currency": "USD" }),
    );
    let missed = app.book(
        &owner.token,
        json!({ "cari_id": agency, "date": TODAY, "time": "12:00", "price": 40 }),
    );
    let cancelled = app.put(
        &format!("/reservations/{}/cancel", missed["id"]),
        &owner.token,
        json!({ "apply_no_show": true, "no_show_amount": 30, "no_show_currency": "EUR" }),
    );
    assert_eq!(cancelled.status, 200, "{}", cancelled.text());

    let cash = app.get("/payment-types", &owner.token).json()[0]["id"].clone();
    let paid = app.post(
        "/transactions",
        &owner.token,
        json!({
            "cari_id": agency,
            "transaction_type": "payment",
            "amount": 60,
            "payment_type_id": cash
        }),
    );
    assert_eq!(paid.status, 201, "{}", paid.text());
    let credit = app.post(
        "/transactions",
        &owner.token,
        json!({ "cari_id": partner, "transaction_type": "credit", "amount": 20 }),
    );
    assert_eq!(credit.status, 201, "{}", credit.text());

    Books {
        app,
        token: owner.token,
        agency,
    }
}

#[test]
fn earnings_skip_cancelled_and_split_currencies() {
    let b = seeded();
    let all = b.app.get("/reports/earnings", &b.token).json();
    assert_eq!(all["reservation_count"], 2);
    assert_eq!(all["atv_total"], 3);
    assert_eq!(total(&all, "totals", "EUR"), 100.0);
    assert_eq!(total(&all, "totals", "USD"), 50.0);

    let one_day = b
        .app
        .get("/reports/earnings?date_from=2025-06-02&date_to=2025-06-02", &b.token)
        .json();
    assert_eq!(one_day["reservation_count"], 1);
    assert_eq!(total(&one_day, "totals", "EUR"), 0.0);
}

#[test]
fn collections_group_by_payment_type() {
    let b = seeded();
    let report = b.app.get("/reports/collections", &b.token).json();
    assert_eq!(total(&report, "totals", "EUR"), 60.0);
    assert_eq!(report["by_payment_type"][0]["payment_type"], "Nakit");
}

#[test]
fn debtors_and_creditors() {
    let b = seeded();
    let debtors = b.app.get("/reports/debtors", &b.token).json();
    let accounts = debtors["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["id"], b.agency);
    assert_eq!(total(&debtors, "totals", "EUR"), 70.0);
    assert_eq!(total(&debtors, "totals", "USD"), 50.0);

    let creditors = b.app.get("/reports/creditors", &b.token).json();
    assert_eq!(creditors["accounts"][0]["name"], "Blue Voyage");
    assert_eq!(total(&creditors, "totals", "EUR"), -20.0);
}

#[test]
fn cancelled_report_counts_no_shows() {
    let b = seeded();
    let report = b.app.get("/reports/cancelled", &b.token).json();
    assert_eq!(report["cancelled_count"], 1);
    assert_eq!(report["no_show_count"], 1);
    assert_eq!(total(&report, "lost_revenue", "EUR"), 40.0);
    assert_eq!(total(&report, "no_show_totals", "EUR"), 30.0);
}

#[test]
fn reservations_export_is_a_workbook() {
    let b = seeded();
    let reply = b.app.get("/reports/reservations.xlsx?status=confirmed", &b.token);
    assert_eq!(reply.status, 200);
    assert!(reply.bytes.starts_with(b"PK"));

    assert_eq!(b.app.get("/reports/reservations.xlsx?status=lost", &b.token).status, 422);
}
