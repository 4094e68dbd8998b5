//! Login, refresh and authentication flows for both domains.
//!
//! Composes the user store, credential validator, issuer and verifier.
//! Argon2 work runs on the blocking pool so request tasks stay responsive.

use std::sync::Arc;

use validator::Validate;

use crate::config::AuthConfig;
use crate::credentials::CredentialValidator;
use crate::domain::{Credentials, Domain, Principal};
use crate::error::{AuthError, ConfigError};
use crate::keys::KeyMaterialProvider;
use crate::password::PasswordHasher;
use crate::token::{Claims, Clock, SystemClock, TokenIssuer, TokenPair, TokenVerifier, VerifyOptions};
use crate::user_store::{UserLookup, normalize_email};

/// Password of the decoy principal checked when an email is unknown.
const DECOY_PASSWORD: &str = "decoy-password-never-matches";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserLookup>,
    validator: CredentialValidator,
    /// Carries a hash made with the configured cost, so an unknown email
    /// pays for one Argon2 comparison like a wrong password does
    decoy: Option<Arc<Principal>>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl AuthService {
    /// Build the service from startup configuration.
    pub fn new(config: &AuthConfig, users: Arc<dyn UserLookup>) -> Result<Self, ConfigError> {
        let keys = Arc::new(KeyMaterialProvider::new(config)?);
        let hasher = PasswordHasher::from_config(&config.password);
        Ok(Self::from_parts(keys, hasher, Arc::new(SystemClock), users))
    }

    pub fn from_parts(
        keys: Arc<KeyMaterialProvider>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserLookup>,
    ) -> Self {
        let decoy = match hasher.hash(DECOY_PASSWORD) {
            Ok(hash) => Some(Arc::new(
                Principal::new("", "")
                    .with_password_hash(hash)
                    .with_admin(true),
            )),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build decoy hash; unknown emails skip hashing");
                None
            }
        };

        Self {
            users,
            validator: CredentialValidator::new(hasher),
            decoy,
            hasher,
            issuer: TokenIssuer::with_clock(keys.clone(), clock.clone()),
            verifier: TokenVerifier::with_clock(keys, clock),
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Exchange email/password for a token pair of `domain`.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, domain: Domain, credentials: Credentials) -> Result<TokenPair, AuthError> {
        credentials
            .validate()
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        let email = normalize_email(&credentials.email);
        let principal = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?;

        let Some(principal) = principal else {
            if let Some(decoy) = self.decoy.clone() {
                self.check_credentials(credentials, decoy, domain).await?;
            }
            tracing::info!(domain = %domain, "Login failed: unknown email");
            return Err(AuthError::CredentialMismatch);
        };

        let accepted = self
            .check_credentials(credentials, Arc::new(principal.clone()), domain)
            .await?;

        if !accepted {
            tracing::info!(domain = %domain, subject = %principal.id, "Login failed: credential mismatch");
            return Err(AuthError::CredentialMismatch);
        }

        let pair = self.issuer.issue(&principal, domain)?;
        tracing::info!(domain = %domain, subject = %principal.id, "Login succeeded");
        Ok(pair)
    }

    async fn check_credentials(
        &self,
        credentials: Credentials,
        principal: Arc<Principal>,
        domain: Domain,
    ) -> Result<bool, AuthError> {
        let validator = self.validator;
        tokio::task::spawn_blocking(move || validator.validate(&credentials, &principal, domain))
            .await
            .map_err(|e| AuthError::Internal(format!("credential check aborted: {}", e)))
    }

    /// Exchange a refresh token for a new pair of the same domain.
    ///
    /// The principal is re-read so revoked admin access takes effect on the
    /// next refresh.
    pub async fn refresh(&self, domain: Domain, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .verifier
            .verify(refresh_token, domain, VerifyOptions::refresh())?
            .into_result()?;

        let principal = self
            .users
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?
            .ok_or(AuthError::PrincipalNotFound)?;

        self.issuer.issue(&principal, domain)
    }

    /// Verify a bearer access token of `domain`.
    pub fn authenticate(&self, domain: Domain, access_token: &str) -> Result<Claims, AuthError> {
        self.verifier
            .verify(access_token, domain, VerifyOptions::access())?
            .into_result()
    }

    /// Hash a new password for storage.
    pub async fn hash_password(&self, plaintext: String) -> Result<String, AuthError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task aborted: {}", e)))?
    }

    /// Lookup helper for callers holding verified claims.
    pub async fn principal(&self, claims: &Claims) -> Result<Option<Principal>, AuthError> {
        self.users
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))
    }
}
