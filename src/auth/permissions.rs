// src/auth/permissions.rs
//
// Typed capability set. A user holds a set of (module, action) pairs; owners,
// admins and super admins implicitly hold every pair.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Calendar,
    Reservations,
    Cari,
    Transactions,
    Reports,
    Settings,
    Users,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Dashboard,
        Module::Calendar,
        Module::Reservations,
        Module::Cari,
        Module::Transactions,
        Module::Reports,
        Module::Settings,
        Module::Users,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[serde(alias = "list")]
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub module: Module,
    pub action: Action,
}

impl Permission {
    pub const fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn all() -> Self {
        Self(
            Module::ALL
                .iter()
                .flat_map(|m| Action::ALL.iter().map(move |a| Permission::new(*m, *a)))
                .collect(),
        )
    }

    pub fn grant(&mut self, module: Module, action: Action) -> &mut Self {
        self.0.insert(Permission::new(module, action));
        self
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.0.contains(&Permission::new(module, action))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Owner,
    Admin,
    #[default]
    Staff,
    /// Corporate user acting for one cari account.
    Cari,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Cari => "cari",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Owner | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "cari" | "corporate_user" => Ok(Role::Cari),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Permissions a user actually holds given its role and stored grants.
pub fn effective(role: Role, granted: &PermissionSet) -> PermissionSet {
    match role {
        Role::SuperAdmin | Role::Owner | Role::Admin => PermissionSet::all(),
        Role::Staff => granted.clone(),
        Role::Cari => {
            let mut set = PermissionSet::default();
            set.grant(Module::Dashboard, Action::View)
                .grant(Module::Reservations, Action::View)
                .grant(Module::Reservations, Action::Create);
            set
        }
    }
}
