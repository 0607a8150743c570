//! Authentication port.
//!
//! The presentation layer resolves a caller to a [`Principal`] through an
//! [`AuthenticationProvider`] before invoking the lending core.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::Principal;

/// What a caller presents to be identified.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret: secret.into(),
        }
    }
}

// Keep secrets out of logs.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unknown login")]
    UnknownLogin,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("login already registered: {0}")]
    AlreadyRegistered(String),
}

/// Resolves a caller to an account and role.
pub trait AuthenticationProvider: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError>;
}

/// Fixed in-memory login table for tests/dev.
///
/// Compares secrets verbatim. Not a substitute for a real identity provider.
#[derive(Debug, Default)]
pub struct StaticAuthenticationProvider {
    logins: RwLock<HashMap<String, (String, Principal)>>,
}

impl StaticAuthenticationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        credentials: Credentials,
        principal: Principal,
    ) -> Result<(), AuthError> {
        let mut logins = self
            .logins
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if logins.contains_key(&credentials.login) {
            return Err(AuthError::AlreadyRegistered(credentials.login));
        }
        logins.insert(credentials.login, (credentials.secret, principal));
        Ok(())
    }
}

impl AuthenticationProvider for StaticAuthenticationProvider {
    fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        let logins = self
            .logins
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (secret, principal) = logins
            .get(&credentials.login)
            .ok_or(AuthError::UnknownLogin)?;
        if *secret != credentials.secret {
            tracing::debug!(login = %credentials.login, "authentication failed");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(*principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::AccountId;

    #[test]
    fn resolves_registered_login() {
        let provider = StaticAuthenticationProvider::new();
        let principal = Principal::member(AccountId::new());
        provider
            .register(Credentials::new("reader@example.org", "pw"), principal)
            .unwrap();

        let resolved = provider
            .authenticate(&Credentials::new("reader@example.org", "pw"))
            .unwrap();
        assert_eq!(resolved, principal);
    }

    #[test]
    fn rejects_wrong_secret_and_unknown_login() {
        let provider = StaticAuthenticationProvider::new();
        provider
            .register(
                Credentials::new("admin", "s3cret"),
                Principal::administrator(AccountId::new()),
            )
            .unwrap();

        assert_eq!(
            provider.authenticate(&Credentials::new("admin", "nope")),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            provider.authenticate(&Credentials::new("ghost", "x")),
            Err(AuthError::UnknownLogin)
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let provider = StaticAuthenticationProvider::new();
        let p = Principal::member(AccountId::new());
        provider.register(Credentials::new("a", "1"), p).unwrap();
        assert!(matches!(
            provider.register(Credentials::new("a", "2"), p),
            Err(AuthError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", Credentials::new("a", "topsecret"));
        assert!(!rendered.contains("topsecret"));
    }
}
