//! HTTP identity provider backed by the hosted auth service.

use super::{Caller, IdentityError, IdentityProvider};
use crate::domain::{PartnerId, Role};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Identity provider that resolves bearer tokens against the hosted auth
/// service's user endpoint.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
}

impl HttpIdentityProvider {
    /// Create a new HTTP identity provider.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn get_user(&self, bearer_token: &str) -> Result<serde_json::Value, IdentityError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .bearer_auth(bearer_token)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(IdentityError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 401 || status == 403 {
                return Err(backoff::Error::permanent(IdentityError::InvalidCredential));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(IdentityError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(IdentityError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(IdentityError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve(&self, bearer_token: &str) -> Result<Caller, IdentityError> {
        debug!("Resolving bearer credential against identity service");

        let response = self.get_user(bearer_token).await?;
        parse_caller(&response)
    }
}

fn parse_caller(user_json: &serde_json::Value) -> Result<Caller, IdentityError> {
    let id = user_json
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| IdentityError::ParseError("Missing id field".to_string()))?;

    let role_str = user_json
        .get("role")
        .and_then(|v| v.as_str())
        .unwrap_or("user");
    let role = Role::from_str(role_str)
        .map_err(|e| IdentityError::ParseError(format!("Invalid role: {}", e)))?;

    Ok(Caller {
        profile_id: PartnerId::new(id.to_string()),
        role,
    })
}
