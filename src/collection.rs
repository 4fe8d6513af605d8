//! Query facade forwarding CRUD and aggregation calls to driver collections.

use crate::db::DatabaseHandle;
use async_trait::async_trait;
use bson::Document;
use mongodb::error::Result as DriverResult;
use mongodb::options::{
    AggregateOptions, CountOptions, DeleteOptions, FindOneAndUpdateOptions, FindOneOptions,
    FindOptions, InsertManyOptions, InsertOneOptions, UpdateOptions,
};
use mongodb::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};
use mongodb::{Collection, Cursor};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use tracing::debug;

/// Projection, limit, skip and sort for read operations.
///
/// Converts into the driver's [`FindOptions`] and [`FindOneOptions`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Fields to include in returned documents.
    pub fields: Option<Vec<String>>,
    /// Maximum number of documents to return.
    pub limit: Option<i64>,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Sort order.
    pub sort: Option<Document>,
}

impl QueryOptions {
    /// Create a builder.
    pub fn builder() -> QueryOptionsBuilder {
        QueryOptionsBuilder::default()
    }

    /// The projection document selecting `fields`.
    pub fn projection(&self) -> Option<Document> {
        self.fields.as_ref().map(|fields| {
            fields
                .iter()
                .map(|field| (field.clone(), bson::Bson::Int32(1)))
                .collect()
        })
    }
}

impl From<QueryOptions> for FindOptions {
    fn from(options: QueryOptions) -> Self {
        let mut find = FindOptions::default();
        find.projection = options.projection();
        find.limit = options.limit;
        find.skip = options.skip;
        find.sort = options.sort;
        find
    }
}

// A single-document lookup has no limit.
impl From<QueryOptions> for FindOneOptions {
    fn from(options: QueryOptions) -> Self {
        let mut find_one = FindOneOptions::default();
        find_one.projection = options.projection();
        find_one.skip = options.skip;
        find_one.sort = options.sort;
        find_one
    }
}

/// Builder for QueryOptions.
#[derive(Debug, Clone, Default)]
pub struct QueryOptionsBuilder {
    options: QueryOptions,
}

impl QueryOptionsBuilder {
    /// Set the projected fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set the limit.
    pub fn limit(mut self, limit: i64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Set the skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    /// Set the sort order.
    pub fn sort(mut self, sort: Document) -> Self {
        self.options.sort = Some(sort);
        self
    }

    /// Build the options.
    pub fn build(self) -> QueryOptions {
        self.options
    }
}

/// The database operations exposed to callers.
///
/// Every method forwards to the driver method of the same name on the named
/// collection and returns the driver's result untouched. Use
/// [`check_mongo_error`](crate::error::check_mongo_error) or
/// [`check_found`](crate::error::check_found) to relabel failures.
#[async_trait]
pub trait MongoOperations {
    /// Get a raw driver collection handle.
    fn get_collection<T: Send + Sync>(&self, collection: &str) -> Collection<T>;

    /// Find a single document.
    async fn find_one<T>(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> DriverResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync;

    /// Find documents matching a filter.
    async fn find<T>(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> DriverResult<Cursor<T>>
    where
        T: DeserializeOwned + Send + Sync;

    /// Atomically find a document and update it.
    async fn find_one_and_update<T>(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<FindOneAndUpdateOptions>,
    ) -> DriverResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync;

    /// Insert a single document.
    async fn insert_one<T>(
        &self,
        collection: &str,
        document: T,
        options: Option<InsertOneOptions>,
    ) -> DriverResult<InsertOneResult>
    where
        T: Serialize + Send + Sync;

    /// Insert multiple documents.
    async fn insert_many<T>(
        &self,
        collection: &str,
        documents: Vec<T>,
        options: Option<InsertManyOptions>,
    ) -> DriverResult<InsertManyResult>
    where
        T: Serialize + Send + Sync;

    /// Update a single document.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> DriverResult<UpdateResult>;

    /// Update multiple documents.
    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> DriverResult<UpdateResult>;

    /// Delete a single document.
    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> DriverResult<DeleteResult>;

    /// Delete multiple documents.
    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> DriverResult<DeleteResult>;

    /// Run an aggregation pipeline.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> DriverResult<Cursor<Document>>;

    /// Count documents matching a filter.
    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
        options: Option<CountOptions>,
    ) -> DriverResult<u64>;
}

/// Facade bound to one database.
///
/// When `debug` is set, every call emits a `debug` event naming the operation
/// and its arguments before it is forwarded.
///
/// # Example
///
/// ```ignore
/// use mongo_facade::prelude::*;
///
/// let facade = mongo_facade::connect("mongodb://localhost:27017", "mydb").await?;
///
/// facade.insert_one("users", doc! { "name": "a" }, None).await?;
/// let user: Document = check_found(facade.find_one("users", doc! { "name": "a" }, None).await)?;
/// ```
#[derive(Debug, Clone)]
pub struct MongoFacade {
    handle: DatabaseHandle,
    /// Log each call before delegating.
    pub debug: bool,
}

impl MongoFacade {
    /// Create a facade over an existing handle, with logging off.
    pub fn new(handle: DatabaseHandle) -> Self {
        Self {
            handle,
            debug: false,
        }
    }

    /// Set the debug flag.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Get the database handle.
    pub fn handle(&self) -> &DatabaseHandle {
        &self.handle
    }

    /// Get the database name.
    pub fn database_name(&self) -> &str {
        self.handle.name()
    }

    /// Ping the server.
    pub async fn ping(&self) -> DriverResult<()> {
        self.handle.ping().await
    }

    /// Shut the underlying client down.
    pub async fn close(self) {
        self.handle.close().await;
    }
}

#[async_trait]
impl MongoOperations for MongoFacade {
    fn get_collection<T: Send + Sync>(&self, collection: &str) -> Collection<T> {
        self.handle.collection(collection)
    }

    async fn find_one<T>(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> DriverResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        if self.debug {
            debug!(operation = "find_one", collection, filter = %Json(&filter), options = ?options, "mongo call");
        }
        self.get_collection::<T>(collection)
            .find_one(filter)
            .with_options(options)
            .await
    }

    async fn find<T>(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> DriverResult<Cursor<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        if self.debug {
            debug!(operation = "find", collection, filter = %Json(&filter), options = ?options, "mongo call");
        }
        self.get_collection::<T>(collection)
            .find(filter)
            .with_options(options)
            .await
    }

    async fn find_one_and_update<T>(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<FindOneAndUpdateOptions>,
    ) -> DriverResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        if self.debug {
            debug!(
                operation = "find_one_and_update",
                collection,
                filter = %Json(&filter),
                update = %Json(&update),
                options = ?options,
                "mongo call"
            );
        }
        self.get_collection::<T>(collection)
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
    }

    async fn insert_one<T>(
        &self,
        collection: &str,
        document: T,
        options: Option<InsertOneOptions>,
    ) -> DriverResult<InsertOneResult>
    where
        T: Serialize + Send + Sync,
    {
        if self.debug {
            debug!(operation = "insert_one", collection, document = %Json(&document), options = ?options, "mongo call");
        }
        self.get_collection::<T>(collection)
            .insert_one(document)
            .with_options(options)
            .await
    }

    async fn insert_many<T>(
        &self,
        collection: &str,
        documents: Vec<T>,
        options: Option<InsertManyOptions>,
    ) -> DriverResult<InsertManyResult>
    where
        T: Serialize + Send + Sync,
    {
        if self.debug {
            debug!(operation = "insert_many", collection, documents = %Json(&documents), options = ?options, "mongo call");
        }
        self.get_collection::<T>(collection)
            .insert_many(documents)
            .with_options(options)
            .await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> DriverResult<UpdateResult> {
        if self.debug {
            debug!(
                operation = "update_one",
                collection,
                filter = %Json(&filter),
                update = %Json(&update),
                options = ?options,
                "mongo call"
            );
        }
        self.get_collection::<Document>(collection)
            .update_one(filter, update)
            .with_options(options)
            .await
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> DriverResult<UpdateResult> {
        if self.debug {
            debug!(
                operation = "update_many",
                collection,
                filter = %Json(&filter),
                update = %Json(&update),
                options = ?options,
                "mongo call"
            );
        }
        self.get_collection::<Document>(collection)
            .update_many(filter, update)
            .with_options(options)
            .await
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> DriverResult<DeleteResult> {
        if self.debug {
            debug!(operation = "delete_one", collection, filter = %Json(&filter), options = ?options, "mongo call");
        }
        self.get_collection::<Document>(collection)
            .delete_one(filter)
            .with_options(options)
            .await
    }

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> DriverResult<DeleteResult> {
        if self.debug {
            debug!(operation = "delete_many", collection, filter = %Json(&filter), options = ?options, "mongo call");
        }
        self.get_collection::<Document>(collection)
            .delete_many(filter)
            .with_options(options)
            .await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> DriverResult<Cursor<Document>> {
        if self.debug {
            debug!(operation = "aggregate", collection, pipeline = %Json(&pipeline), options = ?options, "mongo call");
        }
        self.get_collection::<Document>(collection)
            .aggregate(pipeline)
            .with_options(options)
            .await
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
        options: Option<CountOptions>,
    ) -> DriverResult<u64> {
        if self.debug {
            debug!(operation = "count_documents", collection, filter = %Json(&filter), options = ?options, "mongo call");
        }
        self.get_collection::<Document>(collection)
            .count_documents(filter)
            .with_options(options)
            .await
    }
}

/// Renders a call argument as relaxed extended JSON in log events.
struct Json<'a, T: ?Sized>(&'a T);

impl<T: Serialize + ?Sized> fmt::Display for Json<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match bson::to_bson(self.0) {
            Ok(value) => {
                let json: serde_json::Value = value.into_relaxed_extjson();
                write!(f, "{}", json)
            }
            Err(e) => write!(f, "<unrenderable: {}>", e),
        }
    }
}
