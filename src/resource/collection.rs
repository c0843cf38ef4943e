//! Cosmos DB Mongo API collections
//!
//! The `azure_cosmosdb_mongo_collection` table: its columns, the listing of
//! one database's collections under a parent account, and the point lookup
//! by full key.

use super::row::{Row, RowSink};
use super::schema::{Column, ColumnType, Table, Transform};
use crate::azure::accounts::DatabaseAccount;
use crate::azure::client::Session;
use crate::azure::error::{is_not_found_error, NOT_FOUND_CODES};
use crate::azure::resource_id::resource_group_from_id;
use crate::config::Config;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

pub const TABLE_NAME: &str = "azure_cosmosdb_mongo_collection";

// =============================================================================
// Record
// =============================================================================

/// A Mongo collection as returned by Resource Manager
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MongoCollection {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<Map<String, Value>>,
    #[serde(default)]
    pub properties: Option<CollectionProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionProperties {
    pub resource: Option<CollectionResource>,
    pub options: Option<CollectionOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResource {
    pub id: Option<String>,
    pub analytical_storage_ttl: Option<i64>,
    #[serde(rename = "_rid")]
    pub rid: Option<String>,
    /// Seconds since the epoch; ARM has returned both integers and floats here
    #[serde(rename = "_ts")]
    pub ts: Option<Value>,
    #[serde(rename = "_etag")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOptions {
    pub throughput: Option<i64>,
    pub autoscale_settings: Option<AutoscaleSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoscaleSettings {
    pub max_throughput: Option<i64>,
}

impl MongoCollection {
    fn resource(&self) -> Option<&CollectionResource> {
        self.properties.as_ref()?.resource.as_ref()
    }

    fn options(&self) -> Option<&CollectionOptions> {
        self.properties.as_ref()?.options.as_ref()
    }
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    #[serde(default)]
    value: Vec<MongoCollection>,
}

/// One collection plus the context it was found in
#[derive(Debug, Clone)]
pub struct MongoCollectionInfo {
    pub collection: MongoCollection,
    pub account: String,
    pub database: String,
    pub name: Option<String>,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub subscription_id: String,
    pub cloud_environment: String,
}

type Info = MongoCollectionInfo;

// =============================================================================
// Table definition
// =============================================================================

fn columns() -> Vec<Column<MongoCollectionInfo>> {
    vec![
        Column::new(
            "name",
            ColumnType::String,
            "The friendly name that identifies the Mongo DB collection.",
            |i: &Info| json!(i.name),
        ),
        Column::new(
            "account_name",
            ColumnType::String,
            "The friendly name that identifies the database account in which the collection is created.",
            |i: &Info| json!(i.account),
        ),
        Column::new(
            "database_name",
            ColumnType::String,
            "The friendly name that identifies the database in which the collection is created.",
            |i: &Info| json!(i.database),
        ),
        Column::new(
            "id",
            ColumnType::String,
            "Contains ID to identify a Mongo DB collection uniquely.",
            |i: &Info| json!(i.collection.id),
        ),
        Column::new("type", ColumnType::String, "Type of the resource.", |i: &Info| {
            json!(i.collection.resource_type)
        }),
        Column::new(
            "analytical_storage_ttl",
            ColumnType::Int,
            "Analytical TTL of the collection, in seconds.",
            |i: &Info| json!(i.collection.resource().and_then(|r| r.analytical_storage_ttl)),
        ),
        Column::new(
            "autoscale_settings_max_throughput",
            ColumnType::Int,
            "Contains maximum throughput, the resource can scale up to.",
            |i: &Info| {
                json!(i
                    .collection
                    .options()
                    .and_then(|o| o.autoscale_settings.as_ref())
                    .and_then(|a| a.max_throughput))
            },
        ),
        Column::new(
            "collection_etag",
            ColumnType::String,
            "A system generated property representing the resource etag required for optimistic concurrency control.",
            |i: &Info| json!(i.collection.resource().and_then(|r| r.etag.as_deref())),
        ),
        Column::new(
            "collection_id",
            ColumnType::String,
            "Name of the Cosmos DB Mongo collection.",
            |i: &Info| json!(i.collection.resource().and_then(|r| r.id.as_deref())),
        ),
        Column::new(
            "collection_rid",
            ColumnType::String,
            "A system generated unique identifier for the collection.",
            |i: &Info| json!(i.collection.resource().and_then(|r| r.rid.as_deref())),
        ),
        Column::new(
            "collection_ts",
            ColumnType::Int,
            "A system generated property that denotes the last updated timestamp of the resource.",
            |i: &Info| {
                i.collection
                    .resource()
                    .and_then(|r| r.ts.clone())
                    .unwrap_or(Value::Null)
            },
        )
        .with_transforms(&[Transform::ToInt]),
        Column::new(
            "throughput",
            ColumnType::Int,
            "Contains the value of the Cosmos DB resource throughput or autoscaleSettings.",
            |i: &Info| json!(i.collection.options().and_then(|o| o.throughput)),
        ),
        // Standard columns
        Column::new("title", ColumnType::String, "Title of the resource.", |i: &Info| json!(i.name)),
        Column::new("tags", ColumnType::Json, "A map of tags for the resource.", |i: &Info| {
            json!(i.collection.tags)
        }),
        Column::new(
            "akas",
            ColumnType::Json,
            "Array of globally unique identifier strings (also known as) for the resource.",
            |i: &Info| json!(i.collection.id),
        )
        .with_transforms(&[Transform::IdToAkas]),
        // Azure standard columns
        Column::new(
            "region",
            ColumnType::String,
            "The Azure region/location in which the resource is located.",
            |i: &Info| json!(i.location),
        )
        .with_transforms(&[Transform::ToLower]),
        Column::new(
            "resource_group",
            ColumnType::String,
            "The resource group which holds this resource.",
            |i: &Info| json!(i.resource_group),
        )
        .with_transforms(&[Transform::ToLower]),
        Column::new(
            "subscription_id",
            ColumnType::String,
            "The Azure Subscription ID in which the resource is located.",
            |i: &Info| json!(i.subscription_id),
        ),
        Column::new(
            "cloud_environment",
            ColumnType::String,
            "The Azure Cloud Environment.",
            |i: &Info| json!(i.cloud_environment),
        ),
    ]
}

static TABLE: OnceLock<Table<MongoCollectionInfo>> = OnceLock::new();

/// The table definition (built on first access)
pub fn mongo_collection_table() -> &'static Table<MongoCollectionInfo> {
    TABLE.get_or_init(|| Table {
        name: TABLE_NAME,
        description: "Azure Cosmos DB Mongo Collection",
        get_key_columns: &["account_name", "name", "resource_group", "database_name"],
        list_key_columns: &["database_name"],
        columns: columns(),
    })
}

// =============================================================================
// List
// =============================================================================

/// Stream one row per collection of `database` under `account` into `sink`.
///
/// An empty `database` yields no rows. Stops without error as soon as the
/// sink reports no rows remaining.
pub async fn list_mongo_collections(
    config: &Config,
    account: &DatabaseAccount,
    database: &str,
    sink: &dyn RowSink,
) -> Result<()> {
    tracing::trace!(account = %account.name, database, "list_mongo_collections");

    if database.is_empty() {
        return Ok(());
    }

    let session = Session::open(config).await?;
    let url = session.mongo_collections_url(&account.resource_group, &account.name, database);

    let response = session
        .get(&url)
        .await
        .with_context(|| format!("Failed to list Mongo collections in {}/{}", account.name, database))?;
    let list: CollectionList =
        serde_json::from_value(response).context("Failed to parse collection listing")?;

    // Other enumerations sharing the sink may have filled it during the call
    if sink.rows_remaining() == 0 {
        tracing::debug!(account = %account.name, "Sink already satisfied, dropping listing");
        return Ok(());
    }

    let table = mongo_collection_table();
    let mut emitted = 0usize;

    for collection in list.value {
        // The item's own id decides its resource group, not the parent's
        let resource_group = collection
            .id
            .as_deref()
            .and_then(resource_group_from_id)
            .map(str::to_string);

        let info = MongoCollectionInfo {
            name: collection.name.clone(),
            location: collection.location.clone(),
            collection,
            account: account.name.clone(),
            database: database.to_string(),
            resource_group,
            subscription_id: session.subscription_id.clone(),
            cloud_environment: session.environment.to_string(),
        };

        sink.stream_row(table.row(&info));
        emitted += 1;

        if sink.rows_remaining() == 0 {
            tracing::debug!("Row limit reached after {} rows, stopping", emitted);
            return Ok(());
        }
    }

    tracing::info!(account = %account.name, database, "Listed {} Mongo collections", emitted);
    Ok(())
}

// =============================================================================
// Get
// =============================================================================

/// Full key of a single collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    pub account_name: String,
    pub resource_group: String,
    pub database_name: String,
    pub name: String,
}

impl LookupKey {
    pub fn new(account_name: &str, resource_group: &str, database_name: &str, name: &str) -> Self {
        Self {
            account_name: account_name.to_string(),
            resource_group: resource_group.to_string(),
            database_name: database_name.to_string(),
            name: name.to_string(),
        }
    }

    /// Resource Manager rejects account names shorter than 3 characters and
    /// empty resource groups with a validation error; such keys can never match.
    pub fn is_resolvable(&self) -> bool {
        self.account_name.len() >= 3 && !self.resource_group.is_empty()
    }
}

/// Point lookup behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupOptions {
    /// Report not-found errors as "no row"
    pub ignore_not_found: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            ignore_not_found: true,
        }
    }
}

impl From<&Config> for LookupOptions {
    fn from(config: &Config) -> Self {
        Self {
            ignore_not_found: config.ignore_not_found,
        }
    }
}

/// Fetch a single collection by its full key.
///
/// Unresolvable keys return `Ok(None)` without a remote call.
pub async fn get_mongo_collection(
    config: &Config,
    key: &LookupKey,
    options: LookupOptions,
) -> Result<Option<Row>> {
    tracing::trace!(?key, "get_mongo_collection");

    if !key.is_resolvable() {
        return Ok(None);
    }

    let session = Session::open(config).await?;
    let url = session.mongo_collection_url(
        &key.resource_group,
        &key.account_name,
        &key.database_name,
        &key.name,
    );

    let response = match session.get(&url).await {
        Ok(response) => response,
        Err(err) if options.ignore_not_found && is_not_found_error(NOT_FOUND_CODES)(&err) => {
            tracing::debug!("Collection {} not found, ignoring", key.name);
            return Ok(None);
        },
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to get Mongo collection {}", key.name))
        },
    };

    let collection: MongoCollection =
        serde_json::from_value(response).context("Failed to parse collection")?;

    let info = MongoCollectionInfo {
        name: collection.name.clone(),
        location: collection.location.clone(),
        collection,
        account: key.account_name.clone(),
        database: key.database_name.clone(),
        resource_group: Some(key.resource_group.clone()),
        subscription_id: session.subscription_id.clone(),
        cloud_environment: session.environment.to_string(),
    };

    Ok(Some(mongo_collection_table().row(&info)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::row::RowCollector;

    fn sample() -> MongoCollection {
        serde_json::from_value(json!({
            "id": "/subscriptions/s/resourceGroups/Other-RG/providers/Microsoft.DocumentDB/databaseAccounts/acct/mongodbDatabases/db1/collections/c1",
            "name": "c1",
            "type": "Microsoft.DocumentDB/databaseAccounts/mongodbDatabases/collections",
            "location": "West US",
            "tags": {"env": "prod"},
            "properties": {
                "resource": {
                    "id": "c1",
                    "analyticalStorageTtl": -1,
                    "_rid": "abc=",
                    "_ts": 1700000000.0,
                    "_etag": "\"0000\""
                },
                "options": {
                    "throughput": 400,
                    "autoscaleSettings": {"maxThroughput": 4000}
                }
            }
        }))
        .unwrap()
    }

    fn info(collection: MongoCollection) -> MongoCollectionInfo {
        MongoCollectionInfo {
            name: collection.name.clone(),
            location: collection.location.clone(),
            resource_group: Some("Other-RG".to_string()),
            collection,
            account: "acct".to_string(),
            database: "db1".to_string(),
            subscription_id: "sub".to_string(),
            cloud_environment: "AzurePublicCloud".to_string(),
        }
    }

    #[test]
    fn test_row_has_every_column() {
        let table = mongo_collection_table();
        let row = table.row(&info(sample()));
        assert_eq!(row.len(), table.columns.len());
        assert_eq!(row.len(), 19);
    }

    #[test]
    fn test_row_values() {
        let row = mongo_collection_table().row(&info(sample()));
        assert_eq!(row.get_str("name"), Some("c1"));
        assert_eq!(row.get_str("title"), Some("c1"));
        assert_eq!(row.get_str("account_name"), Some("acct"));
        assert_eq!(row.get_str("database_name"), Some("db1"));
        assert_eq!(row.get("analytical_storage_ttl"), Some(&json!(-1)));
        assert_eq!(row.get("autoscale_settings_max_throughput"), Some(&json!(4000)));
        assert_eq!(row.get("throughput"), Some(&json!(400)));
        assert_eq!(row.get("collection_ts"), Some(&json!(1700000000)));
        assert_eq!(row.get_str("collection_rid"), Some("abc="));
        assert_eq!(row.get_str("collection_etag"), Some("\"0000\""));
        assert_eq!(row.get("tags"), Some(&json!({"env": "prod"})));
        assert_eq!(row.get_str("region"), Some("west us"));
        assert_eq!(row.get_str("resource_group"), Some("other-rg"));
        assert_eq!(row.get_str("cloud_environment"), Some("AzurePublicCloud"));
    }

    #[test]
    fn test_sparse_record_resolves_to_nulls() {
        let row = mongo_collection_table().row(&info(MongoCollection::default()));
        for column in ["id", "type", "throughput", "collection_ts", "tags", "akas", "region"] {
            assert_eq!(row.get(column), Some(&Value::Null), "column {}", column);
        }
    }

    #[test]
    fn test_key_columns_are_described() {
        let summary = mongo_collection_table().describe();
        let get_keys: Vec<&str> = summary.iter().filter(|c| c.get_key).map(|c| c.name).collect();
        assert_eq!(get_keys, vec!["name", "account_name", "database_name", "resource_group"]);

        let list_keys: Vec<&str> = summary.iter().filter(|c| c.list_key).map(|c| c.name).collect();
        assert_eq!(list_keys, vec!["database_name"]);
    }

    #[test]
    fn test_lookup_key_resolvable() {
        assert!(LookupKey::new("abc", "rg", "db", "c").is_resolvable());
        assert!(!LookupKey::new("ab", "rg1", "db1", "c1").is_resolvable());
        assert!(!LookupKey::new("abc", "", "db", "c").is_resolvable());
    }

    #[test]
    fn test_empty_database_yields_no_rows() {
        // No subscription or credentials configured: any session attempt would fail
        let config = Config::default();
        let account = DatabaseAccount::new("acct", "rg", "eastus");
        let sink = RowCollector::new();

        let result = tokio_test::block_on(list_mongo_collections(&config, &account, "", &sink));
        assert!(result.is_ok());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unresolvable_lookup_never_opens_session() {
        let config = Config::default();
        let key = LookupKey::new("ab", "rg1", "db1", "c1");

        let result = tokio_test::block_on(get_mongo_collection(&config, &key, LookupOptions::default()));
        assert!(matches!(result, Ok(None)));
    }
}
