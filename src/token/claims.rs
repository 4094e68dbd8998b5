use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Domain, Principal};

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject (principal id)
    pub sub: String,
    pub email: String,
    /// Advisory on API tokens, required on admin tokens
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    /// Domain the token was minted for
    pub aud: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration time (Unix seconds)
    pub exp: i64,
}

impl Claims {
    pub fn for_principal(principal: &Principal, domain: Domain, iat: i64, ttl_secs: u64) -> Self {
        Self {
            sub: principal.id.clone(),
            email: principal.email.clone(),
            is_admin: principal.is_admin,
            aud: domain.audience().to_string(),
            iat,
            exp: iat.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Domain named by `aud`, if it is one of ours.
    pub fn domain(&self) -> Option<Domain> {
        Domain::from_audience(&self.aud)
    }
}

/// Access/refresh pair returned by a successful issuance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: u64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
