//! Parent-driven listing
//!
//! Enumerates the database accounts of a subscription and lists one
//! database's collections under each, several accounts at a time.

use super::collection::list_mongo_collections;
use super::row::RowSink;
use crate::azure::accounts::{list_database_accounts, DatabaseAccount};
use crate::azure::client::Session;
use crate::config::Config;
use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};

/// Default number of accounts listed concurrently
pub const DEFAULT_CONCURRENCY: usize = 4;

/// List `database`'s collections under every account in the subscription.
///
/// Each account gets its own session. Accounts not yet started when the
/// sink runs out of rows are skipped; the first error aborts the pass.
pub async fn list_all_mongo_collections(
    config: &Config,
    database: &str,
    sink: &dyn RowSink,
    concurrency: usize,
) -> Result<()> {
    if database.is_empty() {
        return Ok(());
    }

    let accounts = {
        let session = Session::open(config).await?;
        list_database_accounts(&session).await?
    };

    list_under_accounts(config, &accounts, database, sink, concurrency).await
}

/// List `database`'s collections under each of `accounts`
pub async fn list_under_accounts(
    config: &Config,
    accounts: &[DatabaseAccount],
    database: &str,
    sink: &dyn RowSink,
    concurrency: usize,
) -> Result<()> {
    tracing::debug!(
        "Listing {} under {} accounts (concurrency {})",
        database,
        accounts.len(),
        concurrency
    );

    stream::iter(accounts)
        .map(|account| async move {
            if sink.rows_remaining() == 0 {
                return Ok(());
            }
            list_mongo_collections(config, account, database, sink).await
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect::<Vec<()>>()
        .await?;

    Ok(())
}
