//! Helpers for the driver cursors returned by `find` and `aggregate`.

use futures::TryStreamExt;
use serde::de::DeserializeOwned;

pub use mongodb::Cursor;

/// Drain a cursor into a vector, stopping at the first error.
///
/// # Example
///
/// ```ignore
/// let cursor = facade.find::<User>("users", doc! { "active": true }, None).await?;
/// let users = collect(cursor).await?;
/// ```
pub async fn collect<T>(cursor: Cursor<T>) -> mongodb::error::Result<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    cursor.try_collect().await
}

/// Drain a cursor, keeping at most `limit` documents.
///
/// The cursor is dropped afterwards, which kills it on the server.
pub async fn collect_limited<T>(
    mut cursor: Cursor<T>,
    limit: usize,
) -> mongodb::error::Result<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut documents = Vec::with_capacity(limit.min(128));
    while documents.len() < limit {
        match cursor.try_next().await? {
            Some(document) => documents.push(document),
            None => break,
        }
    }
    Ok(documents)
}
