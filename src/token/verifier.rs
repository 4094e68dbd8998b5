//! Token verification.
//!
//! One domain, one key, one algorithm per call: the expected domain comes
//! from the caller, the key from that domain's material, and only EdDSA is
//! accepted. Nothing in the token selects a key or an algorithm.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::Deserialize;

use super::claims::Claims;
use super::clock::{Clock, SystemClock};
use crate::domain::{Domain, TokenKind};
use crate::error::{AuthError, RejectReason};
use crate::keys::KeyMaterialProvider;

/// Which key of the domain to verify against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    pub refresh: bool,
}

impl VerifyOptions {
    pub fn access() -> Self {
        Self { refresh: false }
    }

    pub fn refresh() -> Self {
        Self { refresh: true }
    }

    pub fn kind(self) -> TokenKind {
        if self.refresh {
            TokenKind::Refresh
        } else {
            TokenKind::Access
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid { claims: Claims },
    Invalid { reason: RejectReason },
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Valid { claims } => Some(claims),
            Self::Invalid { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { reason } => Some(*reason),
        }
    }

    pub fn into_result(self) -> Result<Claims, AuthError> {
        match self {
            Self::Valid { claims } => Ok(claims),
            Self::Invalid { reason } => Err(AuthError::Rejected(reason)),
        }
    }

    fn invalid(reason: RejectReason) -> Self {
        Self::Invalid { reason }
    }
}

/// Stateless verifier; safe to share across threads.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<KeyMaterialProvider>,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyMaterialProvider>) -> Self {
        Self::with_clock(keys, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: Arc<KeyMaterialProvider>, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::EdDSA);
        // exp and aud are checked below against our own clock and domain
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            keys,
            clock,
            validation,
        }
    }

    /// Verify `token` as a token of `domain`.
    ///
    /// Rejections are returned as [`VerificationOutcome::Invalid`]. The only
    /// error is [`AuthError::KeyMaterialUnusable`].
    pub fn verify(
        &self,
        token: &str,
        domain: Domain,
        options: VerifyOptions,
    ) -> Result<VerificationOutcome, AuthError> {
        if decode_header(token).is_err() {
            return Ok(self.reject(domain, options, RejectReason::Malformed));
        }

        let key = self.keys.resolve(domain).decoding_key(options.kind())?;

        let claims = match decode::<Claims>(token, key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                let reason = classify(e.kind(), token, domain);
                return Ok(self.reject(domain, options, reason));
            }
        };

        // A token of the other domain is WrongDomain whatever its expiry
        if claims.aud != domain.audience() {
            return Ok(self.reject(domain, options, RejectReason::WrongDomain));
        }
        if claims.exp <= self.clock.now() {
            return Ok(self.reject(domain, options, RejectReason::Expired));
        }
        if domain.requires_elevation() && !claims.is_admin {
            return Ok(self.reject(domain, options, RejectReason::MissingElevation));
        }

        Ok(VerificationOutcome::Valid { claims })
    }

    fn reject(
        &self,
        domain: Domain,
        options: VerifyOptions,
        reason: RejectReason,
    ) -> VerificationOutcome {
        tracing::debug!(
            domain = %domain,
            kind = %options.kind(),
            reason = ?reason,
            "Token rejected"
        );
        VerificationOutcome::invalid(reason)
    }
}

fn classify(kind: &ErrorKind, token: &str, expected: Domain) -> RejectReason {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => {
            if minted_for_other_domain(token, expected) {
                RejectReason::WrongDomain
            } else {
                RejectReason::SignatureMismatch
            }
        }
        ErrorKind::ExpiredSignature => RejectReason::Expired,
        ErrorKind::InvalidAudience => RejectReason::WrongDomain,
        _ => RejectReason::Malformed,
    }
}

#[derive(Deserialize)]
struct UnverifiedAudience {
    aud: Option<String>,
}

/// Reads the unverified `aud` only to label a rejection that already
/// happened. Never used to accept a token.
fn minted_for_other_domain(token: &str, expected: Domain) -> bool {
    let Some(segment) = token.split('.').nth(1) else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment) else {
        return false;
    };
    let Ok(unverified) = serde_json::from_slice::<UnverifiedAudience>(&bytes) else {
        return false;
    };
    unverified
        .aud
        .as_deref()
        .and_then(Domain::from_audience)
        .is_some_and(|d| d != expected)
}
