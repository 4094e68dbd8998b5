//! Dual Auth - split-domain token issuance and verification
//!
//! Two trust domains, API and Admin, each with its own EdDSA key material,
//! lifetimes and authorization rules. A token minted for one domain is never
//! accepted by the other.
//!
//! # Modules
//!
//! - [`config`] - YAML + environment configuration
//! - [`keys`] - Per-domain key material resolution
//! - [`password`] - Argon2 password hashing
//! - [`credentials`] - Login credential validation
//! - [`token`] - Claims, issuer and verifier
//! - [`service`] - Login / refresh / authenticate flows
//! - [`user_store`] - User lookup abstraction

// Core types - must be first!
pub mod domain;
pub mod error;
pub mod ttl;

// Startup
pub mod config;
pub mod keys;
pub mod logging;

// Auth components
pub mod credentials;
pub mod password;
pub mod service;
pub mod token;
pub mod user_store;

// Convenient re-exports at crate root
pub use config::AuthConfig;
pub use credentials::CredentialValidator;
pub use domain::{Credentials, Domain, Principal, TokenKind};
pub use error::{AuthError, AuthErrorCode, ConfigError, RejectReason};
pub use keys::{KeyMaterial, KeyMaterialProvider};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::{
    Claims, TokenIssuer, TokenPair, TokenVerifier, VerificationOutcome, VerifyOptions,
};
pub use user_store::{InMemoryUserStore, UserLookup};
