//! Configuration Management
//!
//! Reads the cosmos-collections config file and layers the environment and
//! CLI flags over it. Values resolve CLI > environment > config file >
//! default.

use crate::azure::auth::{AzureCredentials, ClientSecret};
use crate::azure::cloud::CloudEnvironment;
use crate::azure::error::AuthError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

fn default_ignore_not_found() -> bool {
    true
}

/// User configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Subscription to query
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Cloud environment (defaults to the public cloud)
    #[serde(default)]
    pub environment: Option<CloudEnvironment>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Pre-issued bearer token; takes precedence over the client secret
    #[serde(default)]
    pub access_token: Option<String>,
    /// Override for the Resource Manager endpoint (e.g. a private endpoint)
    #[serde(default)]
    pub resource_manager_endpoint: Option<String>,
    /// Override for the Microsoft Entra authority host
    #[serde(default)]
    pub authority_host: Option<String>,
    /// Treat not-found errors on point lookups as "no row"
    #[serde(default = "default_ignore_not_found")]
    pub ignore_not_found: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subscription_id: None,
            environment: None,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            access_token: None,
            resource_manager_endpoint: None,
            authority_host: None,
            ignore_not_found: default_ignore_not_found(),
        }
    }
}

/// Read an env var, treating empty values as unset
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Validate a subscription id: a GUID in 8-4-4-4-12 hex form
pub fn validate_subscription_id(id: &str) -> bool {
    let groups: Vec<&str> = id.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];

    groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cosmos-collections").join("config.json"))
    }

    /// Load configuration: the config file, then environment variables over it.
    ///
    /// CLI flags are applied on top by the caller with [`Config::apply_cli`].
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_env(env_var);
        config
    }

    /// Read the config file, falling back to defaults when absent or invalid
    fn load_file() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Overlay values found by `lookup`, normally the process environment
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overlay = |key: &str, slot: &mut Option<String>| {
            if let Some(value) = lookup(key) {
                *slot = Some(value);
            }
        };

        overlay("AZURE_SUBSCRIPTION_ID", &mut self.subscription_id);
        overlay("AZURE_TENANT_ID", &mut self.tenant_id);
        overlay("AZURE_CLIENT_ID", &mut self.client_id);
        overlay("AZURE_CLIENT_SECRET", &mut self.client_secret);
        overlay("AZURE_ACCESS_TOKEN", &mut self.access_token);
        overlay("AZURE_AUTHORITY_HOST", &mut self.authority_host);

        if let Some(value) = lookup("AZURE_ENVIRONMENT") {
            match value.parse::<CloudEnvironment>() {
                Ok(env) => self.environment = Some(env),
                Err(e) => tracing::warn!("Ignoring AZURE_ENVIRONMENT: {}", e),
            }
        }
    }

    /// Apply command-line overrides, which beat every other source
    pub fn apply_cli(&mut self, subscription: Option<String>, environment: Option<CloudEnvironment>) {
        if subscription.is_some() {
            self.subscription_id = subscription;
        }
        if environment.is_some() {
            self.environment = environment;
        }
    }

    /// Get the effective subscription
    /// Security: Validates the GUID format before returning
    pub fn effective_subscription(&self) -> Result<String> {
        let candidate = self
            .subscription_id
            .clone()
            .context("No subscription configured. Set AZURE_SUBSCRIPTION_ID or pass --subscription")?;

        if !validate_subscription_id(&candidate) {
            tracing::warn!("Invalid subscription id format: {}", candidate);
            anyhow::bail!("Invalid subscription id: {}", candidate);
        }

        Ok(candidate)
    }

    /// Get the effective cloud environment (public cloud unless configured)
    pub fn effective_environment(&self) -> CloudEnvironment {
        self.environment.unwrap_or_default()
    }

    /// Resource Manager endpoint without a trailing slash
    pub fn effective_endpoint(&self) -> String {
        self.resource_manager_endpoint
            .clone()
            .unwrap_or_else(|| self.effective_environment().resource_manager_endpoint().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn effective_authority_host(&self) -> String {
        self.authority_host
            .clone()
            .unwrap_or_else(|| self.effective_environment().authority_host().to_string())
    }

    /// Resolve credentials: access token first, then service principal
    pub fn credentials(&self) -> Result<AzureCredentials> {
        if let Some(token) = self.access_token.clone() {
            return Ok(AzureCredentials::Static(token));
        }

        match (
            self.tenant_id.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                AzureCredentials::client_secret(
                    ClientSecret {
                        tenant_id,
                        client_id,
                        client_secret,
                    },
                    &self.effective_authority_host(),
                    &self.effective_endpoint(),
                )
            },
            _ => Err(AuthError::MissingCredentials.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUB: &str = "00000000-1111-2222-3333-444444444444";

    #[test]
    fn test_validate_subscription_id() {
        assert!(validate_subscription_id(SUB));
        assert!(validate_subscription_id("ABCDEF01-abcd-0000-ffff-0123456789ab"));
        assert!(!validate_subscription_id("not-a-guid"));
        assert!(!validate_subscription_id("00000000-1111-2222-3333-44444444444g"));
        assert!(!validate_subscription_id(""));
    }

    #[test]
    fn test_explicit_subscription_wins() {
        let config = Config {
            subscription_id: Some(SUB.to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_subscription().unwrap(), SUB);
    }

    #[test]
    fn test_invalid_subscription_is_rejected() {
        let config = Config {
            subscription_id: Some("../../etc".to_string()),
            ..Config::default()
        };
        assert!(config.effective_subscription().is_err());
    }

    #[test]
    fn test_endpoint_override_drops_trailing_slash() {
        let config = Config {
            resource_manager_endpoint: Some("http://127.0.0.1:8080/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_endpoint(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_endpoint_follows_environment() {
        let config = Config {
            environment: Some(CloudEnvironment::AzureChinaCloud),
            ..Config::default()
        };
        assert_eq!(config.effective_endpoint(), "https://management.chinacloudapi.cn");
    }

    #[test]
    fn test_access_token_takes_precedence() {
        let config = Config {
            access_token: Some("tok".to_string()),
            tenant_id: Some("t".to_string()),
            client_id: Some("c".to_string()),
            client_secret: Some("s".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.credentials().unwrap(),
            AzureCredentials::Static(ref t) if t == "tok"
        ));
    }

    #[test]
    fn test_missing_file_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.ignore_not_found);
        assert!(config.subscription_id.is_none());
    }

    const FILE_SUB: &str = "22222222-2222-2222-2222-222222222222";
    const ENV_SUB: &str = "11111111-1111-1111-1111-111111111111";
    const CLI_SUB: &str = "33333333-3333-3333-3333-333333333333";

    fn file_config() -> Config {
        serde_json::from_value(serde_json::json!({
            "subscription_id": FILE_SUB,
            "environment": "AzureChinaCloud",
            "access_token": "file-token"
        }))
        .unwrap()
    }

    fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults_apply_without_any_source() {
        let mut config = Config::default();
        config.apply_env(env(&[]));
        config.apply_cli(None, None);

        assert!(config.effective_subscription().is_err());
        assert_eq!(config.effective_environment(), CloudEnvironment::AzurePublicCloud);
        assert!(config.credentials().is_err());
    }

    #[test]
    fn test_file_values_apply_without_env_or_cli() {
        let mut config = file_config();
        config.apply_env(env(&[]));
        config.apply_cli(None, None);

        assert_eq!(config.effective_subscription().unwrap(), FILE_SUB);
        assert_eq!(config.effective_environment(), CloudEnvironment::AzureChinaCloud);
        assert!(matches!(
            config.credentials().unwrap(),
            AzureCredentials::Static(ref t) if t == "file-token"
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = file_config();
        config.apply_env(env(&[
            ("AZURE_SUBSCRIPTION_ID", ENV_SUB),
            ("AZURE_ENVIRONMENT", "AzureUSGovernmentCloud"),
            ("AZURE_ACCESS_TOKEN", "env-token"),
        ]));

        assert_eq!(config.effective_subscription().unwrap(), ENV_SUB);
        assert_eq!(config.effective_environment(), CloudEnvironment::AzureUSGovernmentCloud);
        assert!(matches!(
            config.credentials().unwrap(),
            AzureCredentials::Static(ref t) if t == "env-token"
        ));
    }

    #[test]
    fn test_invalid_env_environment_keeps_file_value() {
        let mut config = file_config();
        config.apply_env(env(&[("AZURE_ENVIRONMENT", "Mars")]));
        assert_eq!(config.effective_environment(), CloudEnvironment::AzureChinaCloud);
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        let mut config = file_config();
        config.apply_env(env(&[
            ("AZURE_SUBSCRIPTION_ID", ENV_SUB),
            ("AZURE_ENVIRONMENT", "AzureUSGovernmentCloud"),
        ]));
        config.apply_cli(Some(CLI_SUB.to_string()), Some(CloudEnvironment::AzurePublicCloud));

        assert_eq!(config.effective_subscription().unwrap(), CLI_SUB);
        assert_eq!(config.effective_environment(), CloudEnvironment::AzurePublicCloud);
    }

    #[test]
    fn test_env_service_principal_fills_in_file_gaps() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("AZURE_TENANT_ID", "tenant"),
            ("AZURE_CLIENT_ID", "client"),
            ("AZURE_CLIENT_SECRET", "secret"),
        ]));
        assert!(matches!(
            config.credentials().unwrap(),
            AzureCredentials::ServicePrincipal { .. }
        ));
    }
}
