use crate::errors::ServerError;
use crate::tests::utils::TestApp;
use http::Method;
use serde_json::json;

#[test]
fn demo_requests_are_public_but_listing_is_not() {
    let app = TestApp::new();
    let invalid = app.call(
        Method::POST,
        "/api/demo-requests",
        None,
        Some(json!({ "full_name": "Deniz", "company_name": "Göreme ATV", "email": "deniz" })),
    );
    assert_eq!(invalid.status, 422);

    let created = app.call(
        Method::POST,
        "/api/demo-requests",
        None,
        Some(json!({
            "full_name": "Deniz Aydın",
            "company_name": "Göreme ATV",
            "email": "deniz@example.com",
            "message": "10 ATVs, two guides"
        })),
    );
    assert_eq!(created.status, 201);

    let owner = app.register("Cappadocia ATV");
    assert_eq!(app.get("/super-admin/demo-requests", &owner.token).status, 403);

    app.state
        .db
        .with_conn(|conn| {
            conn.execute(
                "update users set role = 'super_admin' where id = ?",
                [owner.user_id],
            )
            .map_err(|e| ServerError::DbError(e.to_string()))
        })
        .unwrap();

    let listed = app.get("/super-admin/demo-requests", &owner.token);
    assert_eq!(listed.status, 200);
    let rows = listed.json();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["company_name"], "Göreme ATV");
}
