use std::sync::Arc;

use jsonwebtoken::{Algorithm, Header, encode};

use super::claims::{Claims, TokenPair};
use super::clock::{Clock, SystemClock};
use crate::domain::{Domain, Principal, TokenKind};
use crate::error::AuthError;
use crate::keys::{KeyMaterial, KeyMaterialProvider, KeySlot};
use crate::ttl::whole_seconds;

/// Mints access/refresh pairs. Reads key material, nothing else.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyMaterialProvider>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(keys: Arc<KeyMaterialProvider>) -> Self {
        Self::with_clock(keys, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: Arc<KeyMaterialProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { keys, clock }
    }

    /// Issue an access/refresh pair for `principal` in `domain`.
    ///
    /// Admin tokens are never issued to principals without `is_admin`, even
    /// on explicit request.
    pub fn issue(&self, principal: &Principal, domain: Domain) -> Result<TokenPair, AuthError> {
        authorize(principal, domain)?;

        let material = self.keys.resolve(domain);
        let now = self.clock.now();
        let expires_in = whole_seconds(material.access_ttl());

        let access_token = sign(material, TokenKind::Access, principal, now)?;
        let refresh_token = sign(material, TokenKind::Refresh, principal, now)?;

        tracing::debug!(domain = %domain, subject = %principal.id, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in,
        })
    }

    /// Issue a single access token, same rules as [`TokenIssuer::issue`].
    pub fn issue_access_token(
        &self,
        principal: &Principal,
        domain: Domain,
    ) -> Result<String, AuthError> {
        authorize(principal, domain)?;
        let material = self.keys.resolve(domain);
        sign(material, TokenKind::Access, principal, self.clock.now())
    }
}

fn authorize(principal: &Principal, domain: Domain) -> Result<(), AuthError> {
    if principal.eligible_for(domain) {
        return Ok(());
    }
    tracing::warn!(
        domain = %domain,
        subject = %principal.id,
        "Refused to issue token to principal without admin access"
    );
    Err(AuthError::DomainNotAuthorized { domain })
}

fn sign(
    material: &KeyMaterial,
    kind: TokenKind,
    principal: &Principal,
    now: i64,
) -> Result<String, AuthError> {
    let claims = Claims::for_principal(
        principal,
        material.domain(),
        now,
        whole_seconds(material.ttl(kind)),
    );
    let key = material.encoding_key(kind)?;

    encode(&Header::new(Algorithm::EdDSA), &claims, key).map_err(|e| {
        tracing::error!(domain = %material.domain(), kind = %kind, error = %e, "Token signing failed");
        AuthError::KeyMaterialUnusable {
            domain: material.domain(),
            slot: KeySlot::private(kind),
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::token::clock::FixedClock;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    const NOW: i64 = 1_700_000_000;

    fn issuer() -> TokenIssuer {
        let keys = Arc::new(KeyMaterialProvider::new(&AuthConfig::default()).unwrap());
        TokenIssuer::with_clock(keys, Arc::new(FixedClock::new(NOW)))
    }

    fn payload(token: &str) -> serde_json::Value {
        let segment = token.split('.').nth(1).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_issue_api_pair() {
        let user = Principal::new("u1", "a@b.com");
        let pair = issuer().issue(&user, Domain::Api).unwrap();

        assert_eq!(pair.expires_in, 3600);
        assert_eq!(pair.access_token.split('.').count(), 3);
        assert_ne!(pair.access_token, pair.refresh_token);

        let access = payload(&pair.access_token);
        assert_eq!(access["sub"], "u1");
        assert_eq!(access["email"], "a@b.com");
        assert_eq!(access["isAdmin"], false);
        assert_eq!(access["aud"], "api");
        assert_eq!(access["iat"], NOW);
        assert_eq!(access["exp"], NOW + 3600);

        let refresh = payload(&pair.refresh_token);
        assert_eq!(refresh["exp"], NOW + 7 * 86_400);
    }

    #[test]
    fn test_header_is_eddsa() {
        let user = Principal::new("u1", "a@b.com");
        let token = issuer().issue_access_token(&user, Domain::Api).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::EdDSA);
    }

    #[test]
    fn test_admin_pair_requires_admin_principal() {
        let issuer = issuer();
        let user = Principal::new("u1", "a@b.com");

        let err = issuer.issue(&user, Domain::Admin).unwrap_err();
        assert!(matches!(
            err,
            AuthError::DomainNotAuthorized {
                domain: Domain::Admin
            }
        ));
        assert!(issuer.issue_access_token(&user, Domain::Admin).is_err());

        let admin = user.with_admin(true);
        let pair = issuer.issue(&admin, Domain::Admin).unwrap();
        assert_eq!(payload(&pair.access_token)["aud"], "admin");
        assert_eq!(payload(&pair.refresh_token)["exp"], NOW + 86_400);
    }

    #[test]
    fn test_admin_principal_can_use_api() {
        let admin = Principal::new("a1", "root@b.com").with_admin(true);
        let pair = issuer().issue(&admin, Domain::Api).unwrap();
        assert_eq!(payload(&pair.access_token)["isAdmin"], true);
    }
}
