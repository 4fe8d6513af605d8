//! Database handle binding a driver client to one database.

use bson::{doc, Document};
use mongodb::{Client, Collection, Database};

/// A handle to a MongoDB database.
///
/// Owns the driver client together with the database selected from it. Both
/// are reference counted inside the driver, so cloning the handle is cheap and
/// shares the same connection pool.
///
/// # Example
///
/// ```ignore
/// use mongo_facade::DatabaseHandle;
///
/// let client = mongodb::Client::with_uri_str("mongodb://localhost").await?;
/// let handle = DatabaseHandle::new(client, "mydb");
///
/// let collections = handle.list_collection_names().await?;
/// println!("Collections: {:?}", collections);
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseHandle {
    client: Client,
    database: Database,
}

impl DatabaseHandle {
    /// Bind a client to the named database.
    pub fn new(client: Client, name: &str) -> Self {
        let database = client.database(name);
        Self { client, database }
    }

    /// Get the database name.
    pub fn name(&self) -> &str {
        self.database.name()
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get a handle to a collection with a specific type.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    /// Ping the server through the `admin` database.
    pub async fn ping(&self) -> mongodb::error::Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    /// Run a command against this database.
    ///
    /// ```ignore
    /// let stats = handle.run_command(doc! { "dbStats": 1 }).await?;
    /// ```
    pub async fn run_command(&self, command: Document) -> mongodb::error::Result<Document> {
        self.database.run_command(command).await
    }

    /// List all collection names in this database.
    pub async fn list_collection_names(&self) -> mongodb::error::Result<Vec<String>> {
        self.database.list_collection_names().await
    }

    /// Shut the client down, waiting for outstanding operations.
    ///
    /// Other clones of the client keep the pool alive until they are dropped.
    pub async fn close(self) {
        self.client.shutdown().await;
    }
}
