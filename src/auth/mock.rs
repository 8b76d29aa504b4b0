//! Mock identity provider for testing without network calls.

use super::{Caller, IdentityError, IdentityProvider};
use crate::domain::{PartnerId, Role};
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock identity provider that maps predefined tokens to callers.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    callers: HashMap<String, Caller>,
}

impl MockIdentityProvider {
    /// Create a new mock identity provider with no known tokens.
    pub fn new() -> Self {
        Self {
            callers: HashMap::new(),
        }
    }

    /// Register a token that resolves to the given caller.
    pub fn with_caller(mut self, token: &str, profile_id: &str, role: Role) -> Self {
        self.callers.insert(
            token.to_string(),
            Caller {
                profile_id: PartnerId::new(profile_id.to_string()),
                role,
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn resolve(&self, bearer_token: &str) -> Result<Caller, IdentityError> {
        self.callers
            .get(bearer_token)
            .cloned()
            .ok_or(IdentityError::InvalidCredential)
    }
}
