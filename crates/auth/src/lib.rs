//! `libris-auth`: roles, permissions and the authentication port.
//!
//! The lending core trusts the account id it is handed. This crate decides
//! *who* may call the administrative operations and defines the contract an
//! identity provider must satisfy. It does no real credential verification.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod provider;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use permissions::Permission;
pub use principal::Principal;
pub use provider::{AuthError, AuthenticationProvider, Credentials, StaticAuthenticationProvider};
pub use roles::Role;
