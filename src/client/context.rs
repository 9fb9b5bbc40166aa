// client/context.rs
//
// Session state of a dashboard client, passed to whatever needs it instead of
// living in ambient storage. The durable part is a JSON file; the
// impersonation snapshot lives only as long as the process.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::client::http::{ApiClient, ApiError, ClientConfig};
use crate::db::companies::Company;
use crate::db::users::User;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("context file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("context file {} is unreadable: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// The signed-in identity an admin steps out of while viewing as a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Impersonation {
    pub token: Option<String>,
    pub user: Option<User>,
    pub company: Option<Company>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppContext {
    pub token: Option<String>,
    pub user: Option<User>,
    pub company: Option<Company>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub read_notifications: BTreeSet<i64>,
    pub active_module: Option<String>,
    #[serde(skip)]
    impersonation: Option<Impersonation>,
}

impl AppContext {
    /// A missing file is an empty context.
    pub fn load(path: &Path) -> Result<Self, ContextError> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ContextError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&raw).map_err(|source| ContextError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes through a sibling temp file so a crash never leaves half a file.
    pub fn save(&self, path: &Path) -> Result<(), ContextError> {
        let io = |source| ContextError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_vec_pretty(self).map_err(|source| ContextError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(io)?;
        fs::rename(&tmp, path).map_err(io)
    }

    /// Forgets everything and removes the file.
    pub fn clear(&mut self, path: &Path) -> Result<(), ContextError> {
        *self = Self::default();
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ContextError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn sign_in(&mut self, token: String, user: User, company: Option<Company>) {
        self.token = Some(token);
        self.user = Some(user);
        self.company = company;
    }

    /// Drops identity but keeps display preferences.
    pub fn sign_out(&mut self) {
        self.token = None;
        self.user = None;
        self.company = None;
        self.active_module = None;
        self.impersonation = None;
    }

    pub fn is_impersonating(&self) -> bool {
        self.impersonation.is_some()
    }

    /// Switches to `token`/`user` and remembers the current identity. Nested
    /// impersonation keeps the original snapshot.
    pub fn start_impersonation(&mut self, token: String, user: User, company: Option<Company>) {
        if self.impersonation.is_none() {
            self.impersonation = Some(Impersonation {
                token: self.token.take(),
                user: self.user.take(),
                company: self.company.take(),
            });
        }
        self.sign_in(token, user, company);
    }

    /// Restores the identity saved by `start_impersonation`.
    pub fn end_impersonation(&mut self) -> bool {
        match self.impersonation.take() {
            Some(snapshot) => {
                self.token = snapshot.token;
                self.user = snapshot.user;
                self.company = snapshot.company;
                true
            }
            None => false,
        }
    }

    pub fn mark_notification_read(&mut self, id: i64) -> bool {
        self.read_notifications.insert(id)
    }

    pub fn is_notification_read(&self, id: i64) -> bool {
        self.read_notifications.contains(&id)
    }

    /// HTTP client carrying the current token.
    pub fn api_client(&self, config: &ClientConfig) -> Result<ApiClient, ApiError> {
        let mut client = ApiClient::connect(config)?;
        client.set_token(self.token.clone());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::{PermissionSet, Role};

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            company_id: 1,
            username: format!("user{id}"),
            email: None,
            full_name: format!("User {id}"),
            role,
            cari_id: None,
            permissions: PermissionSet::default(),
            created_at: 0,
        }
    }

    #[test]
    fn round_trips_through_file_without_impersonation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("context.json");

        let mut ctx = AppContext::default();
        ctx.sign_in("admin-token".into(), user(1, Role::Admin), None);
        ctx.theme = Theme::Dark;
        ctx.mark_notification_read(12);
        ctx.start_impersonation("cari-token".into(), user(2, Role::Cari), None);
        ctx.save(&path).unwrap();

        let loaded = AppContext::load(&path).unwrap();
        assert_eq!(loaded.token.as_deref(), Some("cari-token"));
        assert_eq!(loaded.theme, Theme::Dark);
        assert!(loaded.is_notification_read(12));
        assert!(!loaded.is_impersonating());
    }

    #[test]
    fn impersonation_restores_the_admin() {
        let mut ctx = AppContext::default();
        ctx.sign_in("admin-token".into(), user(1, Role::Admin), None);
        ctx.start_impersonation("cari-token".into(), user(2, Role::Cari), None);
        ctx.start_impersonation("other-token".into(), user(3, Role::Cari), None);
        assert!(ctx.end_impersonation());
        assert_eq!(ctx.token.as_deref(), Some("admin-token"));
        assert_eq!(ctx.user.as_ref().map(|u| u.id), Some(1));
        assert!(!ctx.end_impersonation());
    }

    #[test]
    fn missing_file_is_empty_and_clear_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        assert_eq!(AppContext::load(&path).unwrap(), AppContext::default());

        let mut ctx = AppContext::default();
        ctx.token = Some("t".into());
        ctx.save(&path).unwrap();
        ctx.clear(&path).unwrap();
        assert!(!path.exists());
        assert!(!ctx.is_signed_in());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(AppContext::load(&path), Err(ContextError::Corrupt { .. })));
    }
}
