//! Bearer-token resolution.
//!
//! The HTTP layer hands the raw token in; everything downstream only ever
//! sees the resolved user id. Tokens are compared by hex SHA-256 digest so
//! the plaintext never reaches the datastore.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::entities::UserRecord;

use super::repos::{RepoError, UsersRepo};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    /// Resolve a bearer token to its account, if any.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<UserRecord>, RepoError> {
        if token.is_empty() {
            return Ok(None);
        }
        self.users.find_by_token_hash(&hash_token(token)).await
    }
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_hex() {
        let a = hash_token("secret");
        let b = hash_token("secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_tokens_hash_differently() {
        assert_ne!(hash_token("a"), hash_token("b"));
    }
}
