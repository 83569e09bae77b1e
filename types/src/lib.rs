//! Core domain types for Beacon.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod balance;
mod failure;
mod snapshot;

pub use balance::{AccountRef, Asset, BalanceRecord};
pub use failure::{FailureKind, FieldFailure};
pub use snapshot::{
    Counts, LinkField, PersonSummary, Principals, ProbeResult, ProjectSummary, Snapshot,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Principals
// ============================================================================

/// The two principal classes the aggregator authenticates on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user (the project recipient).
    User,
    /// Platform administrator.
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn all() -> [Role; 2] {
        [Role::User, Role::Admin]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("password hash must be a non-empty lowercase hex string")]
pub struct InvalidPasswordHash;

/// Hex-encoded password digest as the platform expects it in the `pwhash` form field.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn from_hex(value: impl Into<String>) -> Result<Self, InvalidPasswordHash> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(value))
        } else {
            Err(InvalidPasswordHash)
        }
    }

    /// Hex-encode a raw digest. Digests are never empty.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

// Manual Debug impl to prevent leaking credentials in logs.
impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PasswordHash(<redacted>)")
    }
}

/// An identity on whose behalf the aggregator authenticates. Supplied per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    password_hash: PasswordHash,
    role: Role,
}

impl Principal {
    #[must_use]
    pub fn new(username: impl Into<String>, password_hash: PasswordHash, role: Role) -> Self {
        Self {
            username: username.into(),
            password_hash,
            role,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

// ============================================================================
// Session Tokens
// ============================================================================

#[derive(Debug, Error)]
#[error("session token must not be empty")]
pub struct EmptyTokenError;

/// Short-lived bearer credential for one principal role.
///
/// Owned by the request that fetched it. Never persisted, never rendered.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    role: Role,
    value: String,
}

impl SessionToken {
    pub fn new(role: Role, value: impl Into<String>) -> Result<Self, EmptyTokenError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(EmptyTokenError);
        }
        Ok(Self { role, value })
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken::{:?}(<redacted>)", self.role)
    }
}
