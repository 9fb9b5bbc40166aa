// api/admin.rs
use astra::Request;

use crate::api::read_json;
use crate::auth::Principal;
use crate::db::demo_requests::{insert_demo_request, list_demo_requests as db_list_demo_requests, DemoRequestInput};
use crate::responses::{created_json, ok_json, ResultResp};
use crate::router::AppState;

/// `POST /demo-requests` (public landing page form).
pub fn create_demo_request(req: &mut Request, app: &AppState) -> ResultResp {
    let input: DemoRequestInput = read_json(req)?;
    input.validate()?;
    let id = app
        .db
        .with_conn(|conn| insert_demo_request(conn, &input, app.now()))?;
    tracing::info!(demo_request_id = id, "demo request received");
    created_json(&serde_json::json!({ "id": id, "message": "demo request received" }))
}

pub fn list_demo_requests(app: &AppState, who: &Principal) -> ResultResp {
    who.require_super_admin()?;
    let requests = app.db.with_conn(|conn| db_list_demo_requests(conn))?;
    ok_json(&requests)
}
