//! Authentication error types.
//!
//! Token verification failures are values ([`RejectReason`]). [`AuthError`]
//! covers issuance, the login flows and unusable key material. Every error
//! maps to a stable [`AuthErrorCode`] so the routing layer can build a
//! response without inspecting internals.

use std::fmt;
use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::domain::Domain;
use crate::keys::KeySlot;

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Not a three-part token, bad encoding, or missing registered claims
    Malformed,
    /// Wrong key, wrong algorithm or tampered content
    SignatureMismatch,
    /// `exp` is not after the current time
    Expired,
    /// Minted for a different domain than the one expected
    WrongDomain,
    /// Admin domain token without `isAdmin == true`
    MissingElevation,
}

impl RejectReason {
    pub fn code(self) -> AuthErrorCode {
        match self {
            Self::Malformed => AuthErrorCode::Malformed,
            Self::SignatureMismatch => AuthErrorCode::SignatureMismatch,
            Self::Expired => AuthErrorCode::Expired,
            Self::WrongDomain => AuthErrorCode::WrongDomain,
            Self::MissingElevation => AuthErrorCode::MissingElevation,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Malformed => "malformed token",
            Self::SignatureMismatch => "signature mismatch",
            Self::Expired => "token expired",
            Self::WrongDomain => "token was issued for another domain",
            Self::MissingElevation => "admin access required",
        })
    }
}

/// Authentication error codes (4101-4110, 5101-5103).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AuthErrorCode {
    /// 4101: Token structure or encoding invalid
    Malformed = 4101,
    /// 4102: Signature verification failed
    SignatureMismatch = 4102,
    /// 4103: Token expired
    Expired = 4103,
    /// 4104: Token belongs to another domain
    WrongDomain = 4104,
    /// 4105: Admin elevation claim missing
    MissingElevation = 4105,
    /// 4106: Principal may not receive tokens for this domain
    DomainNotAuthorized = 4106,
    /// 4107: Email or password did not match
    CredentialMismatch = 4107,
    /// 4108: Credentials failed shape validation
    InvalidCredentials = 4108,
    /// 4110: Token subject no longer exists
    PrincipalNotFound = 4110,
    /// 5101: Key material cannot be used (misconfigured deployment)
    KeyMaterialUnusable = 5101,
    /// 5102: User store failure
    LookupFailed = 5102,
    /// 5103: Internal error
    InternalError = 5103,
}

impl AuthErrorCode {
    /// Get error code as i32.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get error name string.
    pub fn name(self) -> &'static str {
        match self {
            Self::Malformed => "MALFORMED",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::Expired => "EXPIRED",
            Self::WrongDomain => "WRONG_DOMAIN",
            Self::MissingElevation => "MISSING_ELEVATION",
            Self::DomainNotAuthorized => "DOMAIN_NOT_AUTHORIZED",
            Self::CredentialMismatch => "CREDENTIAL_MISMATCH",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::PrincipalNotFound => "PRINCIPAL_NOT_FOUND",
            Self::KeyMaterialUnusable => "KEY_MATERIAL_UNUSABLE",
            Self::LookupFailed => "LOOKUP_FAILED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::MissingElevation | Self::DomainNotAuthorized => StatusCode::FORBIDDEN,
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::KeyMaterialUnusable | Self::LookupFailed | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Errors raised by issuance, the login flows and key usage.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token rejected: {0}")]
    Rejected(RejectReason),

    #[error("{domain} tokens cannot be issued to a principal without admin access")]
    DomainNotAuthorized { domain: Domain },

    #[error("invalid email or password")]
    CredentialMismatch,

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("token subject no longer exists")]
    PrincipalNotFound,

    /// Fatal: the deployment's key material cannot sign or verify.
    #[error("{domain} {slot} key is unusable: {reason}")]
    KeyMaterialUnusable {
        domain: Domain,
        slot: KeySlot,
        reason: String,
    },

    #[error("user lookup failed: {0}")]
    Lookup(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn code(&self) -> AuthErrorCode {
        match self {
            Self::Rejected(reason) => reason.code(),
            Self::DomainNotAuthorized { .. } => AuthErrorCode::DomainNotAuthorized,
            Self::CredentialMismatch => AuthErrorCode::CredentialMismatch,
            Self::InvalidCredentials(_) => AuthErrorCode::InvalidCredentials,
            Self::PrincipalNotFound => AuthErrorCode::PrincipalNotFound,
            Self::KeyMaterialUnusable { .. } => AuthErrorCode::KeyMaterialUnusable,
            Self::Lookup(_) => AuthErrorCode::LookupFailed,
            Self::Hashing(_) | Self::Internal(_) => AuthErrorCode::InternalError,
        }
    }

    /// Whether the process should stop serving auth.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::KeyMaterialUnusable { .. })
    }
}

impl From<RejectReason> for AuthError {
    fn from(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}

/// JSON response body for auth errors.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub code: i32,
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = self.code();
        // 5xx details stay in the logs
        let message = if code.http_status().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = AuthErrorResponse {
            code: code.code(),
            error: code.name(),
            message,
        };
        (code.http_status(), Json(body)).into_response()
    }
}

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid duration literal {0:?}")]
    InvalidDuration(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("{domain} {slot} key is required in production (set a value or path)")]
    MissingKey { domain: Domain, slot: KeySlot },

    #[error("failed to generate fallback key: {0}")]
    KeyGeneration(String),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
