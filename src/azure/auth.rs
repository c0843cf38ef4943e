//! Azure Authentication
//!
//! Resolves a bearer token for Resource Manager calls, either from a
//! pre-issued access token or from a service principal through
//! `azure_identity`.

use super::error::AuthError;
use anyhow::{Context, Result};
use azure_core::auth::TokenCredential;
use azure_core::Url;
use azure_identity::ClientSecretCredential;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Service principal secret used for the client-credentials flow
#[derive(Clone)]
pub struct ClientSecret {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecret")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Credentials for one session
#[derive(Clone)]
pub enum AzureCredentials {
    /// A token issued out of band (e.g. `az account get-access-token`)
    Static(String),
    /// A Microsoft Entra credential, with its tokens cached until shortly before expiry
    ServicePrincipal {
        credential: Arc<dyn TokenCredential>,
        authority_host: String,
        scope: String,
        token_cache: Arc<RwLock<Option<CachedToken>>>,
    },
}

#[derive(Clone)]
pub struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl AzureCredentials {
    /// Credentials for a service principal.
    ///
    /// `resource_manager_endpoint` determines the token audience.
    pub fn client_secret(
        secret: ClientSecret,
        authority_host: &str,
        resource_manager_endpoint: &str,
    ) -> Result<Self> {
        let authority_host = authority_host.trim_end_matches('/').to_string();
        let authority = Url::parse(&authority_host)
            .with_context(|| format!("Invalid authority host: {}", authority_host))?;

        let credential = ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority,
            secret.tenant_id,
            secret.client_id,
            secret.client_secret,
        );

        Ok(AzureCredentials::ServicePrincipal {
            credential: Arc::new(credential),
            authority_host,
            scope: format!("{}/.default", resource_manager_endpoint.trim_end_matches('/')),
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Get an access token for API calls
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<String> {
        match self {
            AzureCredentials::Static(token) => Ok(token.clone()),
            AzureCredentials::ServicePrincipal {
                credential,
                authority_host,
                scope,
                token_cache,
            } => {
                {
                    let cache = token_cache.read().await;
                    if let Some(cached) = cache.as_ref() {
                        if cached.is_valid() {
                            return Ok(cached.token.clone());
                        }
                        tracing::debug!("Cached token expired, fetching new token");
                    }
                }

                let access = credential.get_token(&[scope.as_str()]).await.map_err(|e| {
                    AuthError::TokenRejected {
                        authority: authority_host.clone(),
                        reason: e.to_string(),
                    }
                })?;

                let token = access.token.secret().to_string();
                let ttl = remaining_lifetime(access.expires_on);
                let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

                {
                    let mut cache = token_cache.write().await;
                    *cache = Some(CachedToken {
                        token: token.clone(),
                        expires_at,
                    });
                }

                tracing::debug!(
                    "New token cached, expires in ~{} minutes",
                    ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
                );

                Ok(token)
            },
        }
    }
}

/// Time left until `expires_on`, zero if already past
fn remaining_lifetime(expires_on: OffsetDateTime) -> Duration {
    let secs = (expires_on - OffsetDateTime::now_utc()).whole_seconds();
    Duration::from_secs(secs.max(0) as u64)
}
