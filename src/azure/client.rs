//! Azure Resource Manager session
//!
//! A [`Session`] combines credentials, the HTTP client, the subscription and
//! the management endpoint. Sessions are opened per request and never shared
//! between enumerations.

use super::auth::AzureCredentials;
use super::cloud::CloudEnvironment;
use super::http::ArmHttpClient;
use crate::config::Config;
use anyhow::{Context, Result};
use serde_json::Value;

/// API version for `Microsoft.DocumentDB` calls
pub const DOCUMENTDB_API_VERSION: &str = "2021-10-15";

/// Authenticated client bound to one subscription and endpoint
#[derive(Clone)]
pub struct Session {
    pub credentials: AzureCredentials,
    pub http: ArmHttpClient,
    pub subscription_id: String,
    pub environment: CloudEnvironment,
    pub resource_manager_endpoint: String,
}

impl Session {
    /// Open a session from configuration.
    ///
    /// A token is acquired up front so that authentication failures surface
    /// here rather than on the first API call.
    pub async fn open(config: &Config) -> Result<Self> {
        let subscription_id = config.effective_subscription()?;
        let credentials = config
            .credentials()
            .context("Failed to initialize Azure credentials")?;
        let http = ArmHttpClient::new()?;

        let session = Self {
            credentials,
            http,
            subscription_id,
            environment: config.effective_environment(),
            resource_manager_endpoint: config.effective_endpoint(),
        };

        session
            .get_token()
            .await
            .context("Failed to authenticate with Azure")?;

        tracing::debug!(
            subscription = %session.subscription_id,
            endpoint = %session.resource_manager_endpoint,
            "Session opened"
        );

        Ok(session)
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to an ARM URL
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a subscription-scoped ARM URL with the DocumentDB api-version
    pub fn subscription_url(&self, path: &str) -> String {
        format!(
            "{}/subscriptions/{}/{}?api-version={}",
            self.resource_manager_endpoint,
            self.subscription_id,
            path.trim_start_matches('/'),
            DOCUMENTDB_API_VERSION
        )
    }

    /// Build a URL under a database account
    pub fn database_account_url(&self, resource_group: &str, account: &str, path: &str) -> String {
        self.subscription_url(&format!(
            "resourceGroups/{}/providers/Microsoft.DocumentDB/databaseAccounts/{}/{}",
            urlencoding::encode(resource_group),
            urlencoding::encode(account),
            path
        ))
    }

    /// URL listing every collection of a Mongo database
    pub fn mongo_collections_url(&self, resource_group: &str, account: &str, database: &str) -> String {
        self.database_account_url(
            resource_group,
            account,
            &format!("mongodbDatabases/{}/collections", urlencoding::encode(database)),
        )
    }

    /// URL for a single Mongo collection
    pub fn mongo_collection_url(
        &self,
        resource_group: &str,
        account: &str,
        database: &str,
        collection: &str,
    ) -> String {
        self.database_account_url(
            resource_group,
            account,
            &format!(
                "mongodbDatabases/{}/collections/{}",
                urlencoding::encode(database),
                urlencoding::encode(collection)
            ),
        )
    }

    /// URL listing every database account in the subscription
    pub fn database_accounts_url(&self) -> String {
        self.subscription_url("providers/Microsoft.DocumentDB/databaseAccounts")
    }
}
