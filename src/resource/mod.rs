//! Resource table layer
//!
//! # Architecture
//!
//! - [`schema`] - Column descriptors, transforms and table definitions
//! - [`row`] - Rows and the sinks they are streamed into
//! - [`collection`] - The Mongo collection table: list and get
//! - [`driver`] - Runs the collection listing under every parent account
//!
//! # Example
//!
//! ```ignore
//! use cosmos_collections::resource::{list_mongo_collections, RowCollector};
//!
//! async fn list(config: &Config, account: &DatabaseAccount) -> anyhow::Result<Vec<Row>> {
//!     let sink = RowCollector::with_limit(100);
//!     list_mongo_collections(config, account, "orders", &sink).await?;
//!     Ok(sink.into_rows())
//! }
//! ```

pub mod collection;
pub mod driver;
pub mod row;
pub mod schema;

pub use collection::{
    get_mongo_collection, list_mongo_collections, mongo_collection_table, LookupKey,
    LookupOptions, MongoCollection, MongoCollectionInfo,
};
pub use driver::{list_all_mongo_collections, list_under_accounts, DEFAULT_CONCURRENCY};
pub use row::{ChannelSink, Row, RowCollector, RowSink, StopSignal};
pub use schema::{Column, ColumnSummary, ColumnType, Table, Transform};
