//! Connecting to MongoDB and binding a facade to one database.

use crate::collection::MongoFacade;
use crate::db::DatabaseHandle;
use crate::error::{MongoError, Result};
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::time::Duration;
use tracing::info;

/// Connection settings overlaid onto the options parsed from the URI.
///
/// Fields left unset keep whatever the connection string specified.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Server selection timeout in milliseconds.
    pub server_selection_timeout_ms: Option<u64>,
    /// Maximum number of connections in the pool.
    pub max_pool_size: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_pool_size: Option<u32>,
    /// Application name for server logs.
    pub app_name: Option<String>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
    /// Initial debug flag of the returned facade.
    pub debug: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            server_selection_timeout_ms: None,
            max_pool_size: None,
            min_pool_size: None,
            app_name: None,
            direct_connection: None,
            debug: true,
        }
    }
}

impl ConnectOptions {
    /// Create a builder.
    pub fn builder() -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::default()
    }

    /// Overlay the set fields onto driver options.
    pub fn apply(&self, options: &mut ClientOptions) {
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.server_selection_timeout_ms {
            options.server_selection_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(max) = self.max_pool_size {
            options.max_pool_size = Some(max);
        }
        if let Some(min) = self.min_pool_size {
            options.min_pool_size = Some(min);
        }
        if let Some(ref app) = self.app_name {
            options.app_name = Some(app.clone());
        }
        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }
    }
}

/// Builder for ConnectOptions.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptionsBuilder {
    options: ConnectOptions,
}

impl ConnectOptionsBuilder {
    /// Set the connection timeout.
    pub fn connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.options.connect_timeout_ms = Some(timeout);
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout_ms(mut self, timeout: u64) -> Self {
        self.options.server_selection_timeout_ms = Some(timeout);
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.options.max_pool_size = Some(size);
        self
    }

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.options.min_pool_size = Some(size);
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.options.app_name = Some(name.into());
        self
    }

    /// Enable or disable direct connection.
    pub fn direct_connection(mut self, direct: bool) -> Self {
        self.options.direct_connection = Some(direct);
        self
    }

    /// Set the initial debug flag.
    pub fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    /// Build the options.
    pub fn build(self) -> ConnectOptions {
        self.options
    }
}

/// Connect to MongoDB and bind a facade to `database_name`.
///
/// The server is pinged once before returning. Driver failures (malformed
/// URI, unreachable host, rejected credentials) are returned unmodified in
/// [`MongoError::Driver`]; nothing is retried.
///
/// # Example
///
/// ```ignore
/// let facade = mongo_facade::connect("mongodb://localhost:27017", "mydb").await?;
/// ```
pub async fn connect(uri: &str, database_name: &str) -> Result<MongoFacade> {
    connect_with_options(uri, database_name, ConnectOptions::default()).await
}

/// Connect with custom options.
///
/// # Example
///
/// ```ignore
/// let options = ConnectOptions::builder()
///     .server_selection_timeout_ms(5_000)
///     .app_name("my-app")
///     .debug(false)
///     .build();
/// let facade = connect_with_options("mongodb://localhost", "mydb", options).await?;
/// ```
pub async fn connect_with_options(
    uri: &str,
    database_name: &str,
    options: ConnectOptions,
) -> Result<MongoFacade> {
    if database_name.is_empty() {
        return Err(MongoError::invalid_argument("database name cannot be empty"));
    }

    let mut client_options = ClientOptions::parse(uri).await?;
    options.apply(&mut client_options);

    let hosts = client_options
        .hosts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let client = Client::with_options(client_options)?;
    let handle = DatabaseHandle::new(client, database_name);
    handle.ping().await?;

    info!(database = database_name, hosts = %hosts, "connected to MongoDB");

    Ok(MongoFacade::new(handle).with_debug(options.debug))
}
