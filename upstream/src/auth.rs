//! Credential exchange for the two principal classes.

use beacon_types::{PasswordHash, Principal, Role, SessionToken};
use futures_util::future::join;
use sha3::{Digest, Sha3_512};

use crate::endpoints::Token;
use crate::{FetchError, UpstreamClient};

/// Lowercase hex SHA3-512 digest of `password`, as the platform's `pwhash` field expects.
#[must_use]
pub fn hash_password(password: &str) -> PasswordHash {
    PasswordHash::from_digest(&Sha3_512::digest(password.as_bytes()))
}

/// Exchanges principals for short-lived session tokens.
#[derive(Debug, Clone)]
pub struct CredentialBroker {
    client: UpstreamClient,
}

impl CredentialBroker {
    #[must_use]
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Fetch a fresh token for `principal`.
    ///
    /// A rejected exchange (non-2xx, or an empty token) is [`FetchError::Auth`];
    /// network failures stay [`FetchError::Transport`].
    pub async fn authenticate(&self, principal: &Principal) -> Result<SessionToken, FetchError> {
        let role = principal.role();
        let params = [
            ("username", principal.username()),
            ("pwhash", principal.password_hash().expose_secret()),
        ];

        let response = match self.client.call::<Token>(&params).await {
            Ok(response) => response,
            Err(FetchError::Protocol { status, .. }) => {
                return Err(FetchError::Auth {
                    role,
                    reason: format!("token endpoint returned {status}"),
                });
            }
            Err(e) => return Err(e),
        };

        SessionToken::new(role, response.token).map_err(|_| FetchError::Auth {
            role,
            reason: "token endpoint returned an empty token".to_string(),
        })
    }

    /// Authenticate both principals concurrently.
    ///
    /// Neither exchange waits on the other; each result is returned as-is.
    pub async fn authenticate_pair(
        &self,
        user: &Principal,
        admin: &Principal,
    ) -> (
        Result<SessionToken, FetchError>,
        Result<SessionToken, FetchError>,
    ) {
        debug_assert_eq!(user.role(), Role::User);
        debug_assert_eq!(admin.role(), Role::Admin);
        join(self.authenticate(user), self.authenticate(admin)).await
    }
}
