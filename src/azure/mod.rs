//! Azure Resource Manager interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from a static token or a service principal
//! - [`client`] - [`client::Session`], the per-request authenticated client
//! - [`http`] - HTTP utilities and error formatting
//! - [`error`] - Typed ARM errors and not-found classification
//! - [`cloud`] - Sovereign cloud endpoints
//! - [`accounts`] - Cosmos DB account listing
//! - [`resource_id`] - Resource id parsing
//!
//! # Example
//!
//! ```ignore
//! use cosmos_collections::azure::client::Session;
//! use cosmos_collections::config::Config;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let session = Session::open(&Config::load()).await?;
//!     let accounts = cosmos_collections::azure::accounts::list_database_accounts(&session).await?;
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod auth;
pub mod client;
pub mod cloud;
pub mod error;
pub mod http;
pub mod resource_id;
