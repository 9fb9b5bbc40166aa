// api/auth.rs
//
// Company registration, bearer-token login and user management.
use astra::Request;
use serde::{Deserialize, Serialize};

use crate::api::read_json;
use crate::auth::passwords::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::auth::sessions::{create_session, revoke_session};
use crate::auth::{Action, Module, PermissionSet, Principal, Role};
use crate::db::cari::{get_cari, munferit_id};
use crate::db::companies::{find_company_by_code, get_company, insert_company, Company};
use crate::db::payment_types::seed_defaults;
use crate::db::users::{find_login, insert_user, list_users as db_list_users, NewUser, User};
use crate::domain::validation::Validator;
use crate::errors::ServerError;
use crate::responses::{created_json, message_json, ok_json, ResultResp};
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub company_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub company_code: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
    pub company: Company,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub cari_id: Option<i64>,
    #[serde(default)]
    pub permissions: PermissionSet,
}

fn check_credentials(v: &mut Validator, username: Option<&str>, password: Option<&str>) {
    v.require_text("username", username)
        .require_text("password", password)
        .check(
            "password",
            password.map_or(true, |p| p.chars().count() >= MIN_PASSWORD_LEN),
            &format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
}

/// `POST /auth/register`: a new company with its owner, its Münferit account
/// and the default payment types, all in one transaction.
pub fn register(req: &mut Request, app: &AppState) -> ResultResp {
    let body: RegisterRequest = read_json(req)?;
    let mut v = Validator::new();
    v.require_text("company_name", body.company_name.as_deref());
    check_credentials(&mut v, body.username.as_deref(), body.password.as_deref());
    v.finish()?;

    let password = body.password.as_deref().unwrap_or_default();
    let hash = hash_password(password, app.config.auth.bcrypt_cost)?;
    let now = app.now();
    let username = body.username.as_deref().unwrap_or_default().trim().to_string();
    let full_name = body
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&username)
        .to_string();

    let (user, company, token) = app.db.with_tx(|tx| {
        let company = insert_company(
            tx,
            body.company_name.as_deref().unwrap_or_default().trim(),
            now,
        )?;
        munferit_id(tx, company.id, now)?;
        seed_defaults(tx, company.id)?;
        let user = insert_user(
            tx,
            &NewUser {
                company_id: company.id,
                username: &username,
                email: body.email.as_deref(),
                full_name: &full_name,
                password_hash: &hash,
                role: Role::Owner,
                cari_id: None,
                permissions: &PermissionSet::default(),
            },
            now,
        )?;
        let token = create_session(tx, user.id, now, app.config.auth.session_ttl_secs)?;
        Ok((user, company, token))
    })?;

    tracing::info!(
        company_id = company.id,
        company_code = %company.company_code,
        "company registered"
    );
    created_json(&TokenResponse {
        access_token: token,
        token_type: "bearer",
        user,
        company,
    })
}

/// `POST /auth/login`
pub fn login(req: &mut Request, app: &AppState) -> ResultResp {
    let body: LoginRequest = read_json(req)?;
    let mut v = Validator::new();
    v.require_text("company_code", body.company_code.as_deref())
        .require_text("username", body.username.as_deref())
        .require_text("password", body.password.as_deref());
    v.finish()?;

    let now = app.now();
    let code = body.company_code.as_deref().unwrap_or_default();
    let username = body.username.as_deref().unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();

    let found = app.db.with_conn(|conn| {
        let Some(company) = find_company_by_code(conn, code)? else {
            return Ok(None);
        };
        Ok(find_login(conn, company.id, username)?.map(|(user, hash)| (company, user, hash)))
    })?;

    let Some((company, user, hash)) = found else {
        tracing::warn!(company_code = code, "login for unknown company or user");
        return Err(ServerError::Unauthorized("invalid credentials".into()));
    };
    if !verify_password(password, &hash) {
        tracing::warn!(user_id = user.id, "login with wrong password");
        return Err(ServerError::Unauthorized("invalid credentials".into()));
    }

    let token = app.db.with_conn(|conn| {
        create_session(conn, user.id, now, app.config.auth.session_ttl_secs)
    })?;
    tracing::info!(user_id = user.id, company_id = company.id, "login");

    ok_json(&TokenResponse {
        access_token: token,
        token_type: "bearer",
        user,
        company,
    })
}

/// `GET /auth/me`: the caller, its company and effective permissions.
pub fn me(app: &AppState, who: &Principal) -> ResultResp {
    let (company, cari_name) = app.db.with_conn(|conn| {
        let company = get_company(conn, who.company_id())?
            .ok_or_else(|| ServerError::not_found("company"))?;
        let cari_name = match who.user.cari_id {
            Some(id) => get_cari(conn, who.company_id(), id)?.map(|c| c.name),
            None => None,
        };
        Ok((company, cari_name))
    })?;

    ok_json(&serde_json::json!({
        "user": who.user,
        "company": company,
        "permissions": who.permissions,
        "is_admin": who.role().is_admin(),
        "is_super_admin": who.role() == Role::SuperAdmin,
        "cari_name": cari_name,
    }))
}

pub fn logout(app: &AppState, who: &Principal) -> ResultResp {
    let now = app.now();
    app.db
        .with_conn(|conn| revoke_session(conn, &who.token, now))?;
    message_json("logged out")
}

pub fn list_users(app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Users, Action::View)?;
    let users = app.db.with_conn(|conn| db_list_users(conn, who.company_id()))?;
    ok_json(&users)
}

/// `POST /users`: admins add staff (with explicit permissions) or corporate
/// users bound to one cari.
pub fn create_user(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require_admin()?;
    let body: CreateUserRequest = read_json(req)?;

    let mut v = Validator::new();
    check_credentials(&mut v, body.username.as_deref(), body.password.as_deref());
    v.check(
        "cari_id",
        body.role != Role::Cari || body.cari_id.is_some(),
        "required for cari users",
    )
    .check(
        "role",
        body.role != Role::SuperAdmin || who.role() == Role::SuperAdmin,
        "only a super admin can grant super_admin",
    );
    v.finish()?;

    let company_id = who.company_id();
    if let Some(cari_id) = body.cari_id {
        let exists = app
            .db
            .with_conn(|conn| Ok(get_cari(conn, company_id, cari_id)?.is_some()))?;
        if !exists {
            return Err(ServerError::not_found("cari account"));
        }
    }

    let hash = hash_password(
        body.password.as_deref().unwrap_or_default(),
        app.config.auth.bcrypt_cost,
    )?;
    let username = body.username.as_deref().unwrap_or_default().trim().to_string();
    let full_name = body
        .full_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| username.clone());
    let now = app.now();

    let user = app.db.with_conn(|conn| {
        insert_user(
            conn,
            &NewUser {
                company_id,
                username: &username,
                email: body.email.as_deref(),
                full_name: &full_name,
                password_hash: &hash,
                role: body.role,
                cari_id: body.cari_id,
                permissions: &body.permissions,
            },
            now,
        )
    })?;

    tracing::info!(user_id = user.id, company_id, role = user.role.as_str(), "user created");
    created_json(&user)
}
