//! Token issuance and verification.
//!
//! ## Components
//! - `claims`: signed payload and the issued token pair
//! - `clock`: time source shared by issuer and verifier
//! - `issuer`: mints access/refresh pairs per domain
//! - `verifier`: checks signature, expiry, audience and elevation

pub mod claims;
pub mod clock;
pub mod issuer;
pub mod verifier;

// Re-export for convenience
pub use claims::{Claims, TokenPair};
pub use clock::{Clock, FixedClock, SystemClock};
pub use issuer::TokenIssuer;
pub use verifier::{TokenVerifier, VerificationOutcome, VerifyOptions};
