//! Cosmos DB database accounts
//!
//! Lists the accounts of a subscription. These are the parents the
//! collection table is enumerated under.

use super::client::Session;
use super::resource_id::{name_from_id, resource_group_from_id};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// A Cosmos DB account, as needed to scope child listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseAccount {
    pub name: String,
    pub resource_group: String,
    pub location: String,
}

impl DatabaseAccount {
    pub fn new(name: &str, resource_group: &str, location: &str) -> Self {
        Self {
            name: name.to_string(),
            resource_group: resource_group.to_string(),
            location: location.to_string(),
        }
    }

    /// Build an account from an ARM account document.
    ///
    /// Returns `None` when the id carries no resource group.
    fn from_resource(raw: RawAccount) -> Option<Self> {
        let id = raw.id?;
        let resource_group = resource_group_from_id(&id)?.to_string();
        let name = raw
            .name
            .or_else(|| name_from_id(&id).map(str::to_string))?;

        Some(Self {
            name,
            resource_group,
            location: raw.location.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    id: Option<String>,
    name: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountPage {
    #[serde(default)]
    value: Vec<RawAccount>,
    next_link: Option<String>,
}

/// Only follow `nextLink` on the endpoint the session was opened for, so the
/// bearer token never leaves it.
fn same_origin(next_link: &str, endpoint: &str) -> bool {
    match (url::Url::parse(next_link), url::Url::parse(endpoint)) {
        (Ok(next), Ok(base)) => next.origin() == base.origin(),
        _ => false,
    }
}

/// List every database account in the session's subscription (auto-paginate)
pub async fn list_database_accounts(session: &Session) -> Result<Vec<DatabaseAccount>> {
    let mut accounts = Vec::new();
    let mut url = session.database_accounts_url();

    loop {
        let response: Value = session
            .get(&url)
            .await
            .context("Failed to list Cosmos DB accounts")?;
        let page: AccountPage =
            serde_json::from_value(response).context("Failed to parse account listing")?;

        for raw in page.value {
            match DatabaseAccount::from_resource(raw) {
                Some(account) => accounts.push(account),
                None => tracing::warn!("Skipping account without a resource group in its id"),
            }
        }

        match page.next_link {
            Some(next) if same_origin(&next, &session.resource_manager_endpoint) => url = next,
            Some(next) => {
                anyhow::bail!("Refusing to follow nextLink to a different host: {}", next)
            },
            None => break,
        }
    }

    tracing::debug!("Found {} database accounts", accounts.len());
    Ok(accounts)
}
