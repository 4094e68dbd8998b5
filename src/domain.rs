//! Trust domains and the principal record supplied by the user store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

/// Trust domain a token is minted for and verified against.
///
/// Each domain owns its own key material, lifetimes and authorization rules.
/// The caller always states the domain it expects; it is never read from a
/// token before that token has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Public-facing API
    Api,
    /// Privileged admin console
    Admin,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Api, Domain::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Admin => "admin",
        }
    }

    /// Value of the `aud` claim for tokens minted in this domain.
    pub fn audience(self) -> &'static str {
        self.as_str()
    }

    /// Reverse of [`Domain::audience`].
    pub fn from_audience(aud: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.audience() == aud)
    }

    /// Whether tokens of this domain must carry `isAdmin == true`.
    pub fn requires_elevation(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown domain {0:?} (expected \"api\" or \"admin\")")]
pub struct ParseDomainError(String);

impl FromStr for Domain {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseDomainError(s.to_string())),
        }
    }
}

/// Access or refresh token. Each kind has its own key pair per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        })
    }
}

/// User record as returned by the user store.
///
/// This crate never persists or mutates principals.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string; `None` for accounts without a password.
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl Principal {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            password_hash: None,
            is_admin: false,
        }
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Whether tokens for `domain` may be minted for this principal.
    pub fn eligible_for(&self, domain: Domain) -> bool {
        !domain.requires_elevation() || self.is_admin
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "<redacted>"),
            )
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Login request body.
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct Credentials {
    #[schema(example = "user1@example.com")]
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[schema(example = "password123")]
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
