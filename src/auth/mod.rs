pub mod passwords;
pub mod permissions;
pub mod principal;
pub mod sessions;
pub mod token;

pub use permissions::{Action, Module, PermissionSet, Role};
pub use principal::{authenticate, Principal};
