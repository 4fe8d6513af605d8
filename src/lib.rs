//! # mongo-facade
//!
//! A thin facade over the official MongoDB driver.
//!
//! This crate connects to a database, keeps the handle, and forwards CRUD and
//! aggregation calls to the driver's collection methods. Each call can be
//! logged through `tracing`, and driver errors can be relabeled as
//! `NOT_FOUND`, `INDEX_DUPLICATED` or `NETWORK_ERROR`.
//!
//! ## Features
//!
//! - One method per operation, returning exactly what the driver returns
//! - Ping-verified connect
//! - Optional per-call debug logging
//! - Error classification helpers
//!
//! ## Quick Start
//!
//! ```ignore
//! use mongo_facade::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> mongo_facade::Result<()> {
//!     let facade = mongo_facade::connect("mongodb://localhost:27017", "mydb").await?;
//!
//!     // Insert a document
//!     let inserted = check_mongo_error(
//!         facade.insert_one("users", doc! { "name": "a" }, None).await,
//!     )?;
//!     println!("Inserted ID: {:?}", inserted.inserted_id);
//!
//!     // Find it again
//!     let user: Document = check_found(
//!         facade.find_one("users", doc! { "name": "a" }, None).await,
//!     )?;
//!
//!     println!("Found: {}", user);
//!
//!     // Delete it
//!     check_mongo_error(facade.delete_one("users", doc! { "name": "a" }, None).await)?;
//!
//!     facade.close().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod collection;
pub mod cursor;
pub mod db;
pub mod error;

// Re-export main types
pub use client::{connect, connect_with_options, ConnectOptions, ConnectOptionsBuilder};
pub use collection::{MongoFacade, MongoOperations, QueryOptions, QueryOptionsBuilder};
pub use db::DatabaseHandle;
pub use error::{check_found, check_mongo_error, classify, ErrorKind, MongoError, Result};

// Re-export bson and the driver for convenience
pub use bson;
pub use bson::doc;
pub use mongodb;

/// Prelude module for common imports.
pub mod prelude {
    pub use super::client::{connect, connect_with_options, ConnectOptions};
    pub use super::collection::{MongoFacade, MongoOperations, QueryOptions};
    pub use super::cursor::{collect, Cursor};
    pub use super::db::DatabaseHandle;
    pub use super::error::{check_found, check_mongo_error, classify, ErrorKind, MongoError, Result};
    pub use bson::{doc, Document};
    pub use serde::{Deserialize, Serialize};
}

/// Get the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
