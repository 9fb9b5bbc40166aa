use crate::tests::utils::{TestApp, TODAY};
use serde_json::{json, Value};

fn status_of(dashboard: &Value, id: &Value) -> Value {
    dashboard["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| &s["reservation_id"] == id)
        .map(|s| s["status"].clone())
        .unwrap_or(Value::Null)
}

#[test]
fn day_view_totals_hours_and_statuses() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let book = |time: &str, atv: i64| {
        app.book(
            &owner.token,
            json!({ "date": TODAY, "time": time, "atv_count": atv, "person_count": atv * 2 }),
        )
    };
    let early = book("08:00", 1);
    let nine = book("09:00", 4);
    book("09:30", 3);
    let later = book("11:00", 2);
    let dropped = book("09:15", 6);
    let cancelled = app.put(
        &format!("/reservations/{}/cancel", dropped["id"]),
        &owner.token,
        json!({}),
    );
    assert_eq!(cancelled.status, 200, "{}", cancelled.text());

    let d = app.get("/dashboard", &owner.token).json();
    assert_eq!(d["date"], TODAY);
    assert_eq!(d["is_today"], true);
    assert_eq!(d["totals"]["departures"], 4);
    assert_eq!(d["totals"]["atv_total"], 10);
    assert_eq!(d["totals"]["person_total"], 20);
    assert_eq!(d["busy_hour_threshold"], 5);

    assert_eq!(d["hours"].as_array().unwrap().len(), 24);
    assert_eq!(d["hours"][9]["atv_total"], 7);
    assert_eq!(d["busy_hours"], json!([9]));

    assert_eq!(status_of(&d, &early["id"]), "active");
    assert_eq!(status_of(&d, &nine["id"]), "active");
    assert_eq!(status_of(&d, &later["id"]), "pending");
    assert_eq!(status_of(&d, &dropped["id"]), "cancelled");
    assert_eq!(d["tours"]["upcoming"], json!([later["id"]]));
    assert_eq!(d["pending_count"], 0);
}

#[test]
fn tour_length_is_bounded() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    let huge = app.post(
        "/tour-types",
        &owner.token,
        json!({ "name": "Expedition", "duration_hours": 1e9 }),
    );
    assert_eq!(huge.status, 422);
    assert_eq!(huge.json()["detail"][0]["loc"], json!(["body", "duration_hours"]));

    let day = app.post(
        "/tour-types",
        &owner.token,
        json!({ "name": "Full day", "duration_hours": 24 }),
    );
    assert_eq!(day.status, 201);
    let tour_id = day.json()["id"].as_i64().unwrap();
    let r = app.book(
        &owner.token,
        json!({ "date": TODAY, "time": "08:00", "tour_type_id": tour_id }),
    );

    let d = app.get("/dashboard", &owner.token).json();
    assert_eq!(status_of(&d, &r["id"]), "active");
    assert_eq!(d["tours"]["active"], json!([r["id"]]));
}

#[test]
fn other_days_and_bad_dates() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    app.book(&owner.token, json!({ "date": "2025-06-02", "time": "10:00" }));

    let d = app.get("/dashboard?date=2025-06-02", &owner.token).json();
    assert_eq!(d["is_today"], false);
    assert_eq!(d["totals"]["departures"], 1);
    assert_eq!(d["tours"]["upcoming"].as_array().unwrap().len(), 1);

    let bad = app.get("/dashboard?date=June", &owner.token);
    assert_eq!(bad.status, 422);
    assert_eq!(bad.json()["detail"][0]["loc"], json!(["query", "date"]));
}

#[test]
fn calendar_week_and_month() {
    let app = TestApp::new();
    let owner = app.register("Cappadocia ATV");
    app.book(
        &owner.token,
        json!({ "date": "2025-06-03", "time": "10:00", "atv_count": 2, "customer_name": "Ayşe Demir" }),
    );
    app.book(&owner.token, json!({ "date": "2025-06-20", "time": "10:00" }));

    let week = app.get("/calendar?view=week&anchor=2025-06-04", &owner.token).json();
    assert_eq!(week["view"], "week");
    assert_eq!(week["range"], json!({ "start": "2025-06-02", "end": "2025-06-08" }));
    assert_eq!(week["days"].as_array().unwrap().len(), 7);
    assert_eq!(week["days"][1]["reservation_count"], 1);
    assert_eq!(week["days"][1]["atv_total"], 2);
    assert_eq!(week["reservations"].as_array().unwrap().len(), 1);

    let month = app.get("/calendar", &owner.token).json();
    assert_eq!(month["view"], "month");
    assert_eq!(month["days"].as_array().unwrap().len(), 30);
    assert_eq!(month["reservations"].as_array().unwrap().len(), 2);

    let searched = app.get("/calendar?search=ay%C5%9Fe", &owner.token).json();
    assert_eq!(searched["reservations"].as_array().unwrap().len(), 1);

    assert_eq!(app.get("/calendar?view=decade", &owner.token).status, 422);
}
