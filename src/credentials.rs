use crate::domain::{Credentials, Domain, Principal};
use crate::password::PasswordHasher;

/// Gate every login passes before a token is minted.
///
/// Fails closed: any doubt is `false`, never an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialValidator {
    hasher: PasswordHasher,
}

impl CredentialValidator {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }

    pub fn validate(&self, credentials: &Credentials, principal: &Principal, domain: Domain) -> bool {
        let Some(hash) = principal.password_hash.as_deref() else {
            tracing::debug!(domain = %domain, subject = %principal.id, "Principal has no password set");
            return false;
        };

        // Hash first so an ineligible principal costs the same as a wrong password
        let matches = self.hasher.compare(&credentials.password, hash);

        if !principal.eligible_for(domain) {
            tracing::debug!(domain = %domain, subject = %principal.id, "Principal not eligible for domain");
            return false;
        }

        matches
    }
}
