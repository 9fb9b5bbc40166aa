// src/auth/principal.rs
use astra::Request;

use crate::auth::permissions::{effective, Action, Module, PermissionSet, Role};
use crate::auth::sessions::session_user_id;
use crate::db::connection::Database;
use crate::db::users::{get_user, User};
use crate::errors::ServerError;

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub permissions: PermissionSet,
    pub token: String,
}

impl Principal {
    pub fn new(user: User, token: String) -> Self {
        let permissions = effective(user.role, &user.permissions);
        Self {
            user,
            permissions,
            token,
        }
    }

    pub fn company_id(&self) -> i64 {
        self.user.company_id
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn can(&self, module: Module, action: Action) -> bool {
        self.permissions.allows(module, action)
    }

    pub fn require(&self, module: Module, action: Action) -> Result<(), ServerError> {
        if self.can(module, action) {
            Ok(())
        } else {
            Err(ServerError::Forbidden(format!(
                "missing permission {module:?}/{action:?}"
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), ServerError> {
        if self.role().is_admin() {
            Ok(())
        } else {
            Err(ServerError::Forbidden("admin access required".into()))
        }
    }

    pub fn require_super_admin(&self) -> Result<(), ServerError> {
        if self.role() == Role::SuperAdmin {
            Ok(())
        } else {
            Err(ServerError::Forbidden("super admin access required".into()))
        }
    }
}

/// Raw token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &Request) -> Option<String> {
    let value = req.headers().get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim().to_string())
}

pub fn authenticate(req: &Request, db: &Database, now: i64) -> Result<Principal, ServerError> {
    let token = bearer_token(req)
        .ok_or_else(|| ServerError::Unauthorized("missing bearer token".into()))?;

    let user = db.with_conn(|conn| match session_user_id(conn, &token, now)? {
        Some(user_id) => get_user(conn, user_id),
        None => Ok(None),
    })?;

    match user {
        Some(user) => Ok(Principal::new(user, token)),
        None => Err(ServerError::Unauthorized(
            "invalid or expired session".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra::Body;

    #[test]
    fn bearer_token_parses_header() {
        let req = http::Request::builder()
            .header("Authorization", "Bearer abc.def")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def"));

        let req = http::Request::builder()
            .header("Authorization", "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req), None);

        let req = http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&req), None);
    }
}
