//! Tests for the mongo-facade crate.
//!
//! Connection failures, classification and option conversion run without a
//! server. The `live_tests` module needs a reachable MongoDB and reads its
//! connection string from `MONGODB_URI`; each test returns early when the
//! variable is unset.

use bson::{doc, oid::ObjectId, Document};
use mongo_facade::{
    cursor::{collect, collect_limited},
    error::is_duplicate_key_code,
    mongodb::{
        options::{
            ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
            UpdateOptions,
        },
        Client, IndexModel,
    },
    prelude::*,
};
use std::time::Duration;

// ============================================================================
// Test Document Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct User {
    name: String,
    email: String,
    #[serde(default)]
    age: i32,
}

impl User {
    fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_string(),
            email: format!("{}@test.com", name),
            age,
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A facade whose client points at a closed port.
async fn unreachable_facade() -> MongoFacade {
    let mut options = ClientOptions::parse("mongodb://127.0.0.1:1").await.unwrap();
    options.server_selection_timeout = Some(Duration::from_millis(100));
    options.connect_timeout = Some(Duration::from_millis(100));
    let client = Client::with_options(options).unwrap();
    MongoFacade::new(DatabaseHandle::new(client, "testdb"))
}

// ============================================================================
// Connect Tests
// ============================================================================

mod connect_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_connect_unreachable_host_returns_error() {
        let options = ConnectOptions::builder()
            .server_selection_timeout_ms(200)
            .connect_timeout_ms(200)
            .build();

        let result = connect_with_options("mongodb://127.0.0.1:1", "testdb", options).await;
        let err = result.unwrap_err();
        assert!(err.driver_error().is_some());
        assert_eq!(err.classified().kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_connect_invalid_uri_returns_error() {
        let err = connect("http://localhost:27017", "testdb").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_connect_empty_database_name() {
        let err = connect("mongodb://127.0.0.1:1", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

// ============================================================================
// Facade Tests (no server)
// ============================================================================

mod facade_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_collection_accessor_for_any_name() {
        let facade = unreachable_facade().await;
        for name in ["users", "orders", "audit.log"] {
            let collection = facade.get_collection::<Document>(name);
            assert_eq!(collection.name(), name);
        }
    }

    #[tokio::test]
    async fn test_debug_flag_does_not_change_errors() {
        init_tracing();
        let mut facade = unreachable_facade().await;

        facade.debug = false;
        let quiet = facade
            .count_documents("users", doc! { "name": "a" }, None)
            .await
            .unwrap_err();

        facade.debug = true;
        let logged = facade
            .count_documents("users", doc! { "name": "a" }, None)
            .await
            .unwrap_err();

        assert_eq!(classify(quiet).kind(), classify(logged).kind());
    }

    #[tokio::test]
    async fn test_debug_flag_does_not_change_error_message() {
        init_tracing();
        let quiet_facade = unreachable_facade().await.with_debug(false);
        let logged_facade = quiet_facade.clone().with_debug(true);

        let quiet = check_found(
            quiet_facade
                .find_one::<Document>("users", doc! { "name": "a" }, None)
                .await,
        )
        .unwrap_err();
        let logged = check_found(
            logged_facade
                .find_one::<Document>("users", doc! { "name": "a" }, None)
                .await,
        )
        .unwrap_err();

        assert_eq!(quiet.kind(), logged.kind());
        assert!(quiet.to_string().starts_with("NETWORK_ERROR: "));
        assert!(logged.to_string().starts_with("NETWORK_ERROR: "));
    }

    #[tokio::test]
    async fn test_unreachable_find_one_is_network_error() {
        let facade = unreachable_facade().await.with_debug(true);
        let result = facade
            .find_one::<Document>("users", doc! {}, Some(QueryOptions::default().into()))
            .await;
        assert_eq!(check_found(result).unwrap_err().kind(), ErrorKind::Network);
    }

    #[test]
    fn test_query_options_into_find_options() {
        let find: FindOptions = QueryOptions::builder()
            .fields(["name", "email"])
            .limit(10)
            .skip(20)
            .sort(doc! { "age": 1 })
            .build()
            .into();

        assert_eq!(find.projection, Some(doc! { "name": 1, "email": 1 }));
        assert_eq!(find.limit, Some(10));
        assert_eq!(find.skip, Some(20));
        assert_eq!(find.sort, Some(doc! { "age": 1 }));
    }

    #[test]
    fn test_duplicate_key_code_table() {
        assert!(is_duplicate_key_code(11000, ""));
        assert!(!is_duplicate_key_code(50, "operation exceeded time limit"));
    }
}

// ============================================================================
// Live Tests (MONGODB_URI)
// ============================================================================

mod live_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Connects to a fresh, uniquely named database.
    async fn live_facade() -> Option<MongoFacade> {
        let uri = std::env::var("MONGODB_URI").ok()?;
        init_tracing();
        let database = format!("mongo_facade_test_{}", ObjectId::new().to_hex());
        Some(connect(&uri, &database).await.unwrap())
    }

    async fn drop_database(facade: MongoFacade) {
        facade.handle().database().drop().await.unwrap();
        facade.close().await;
    }

    #[tokio::test]
    async fn test_insert_find_delete_roundtrip() {
        let Some(facade) = live_facade().await else {
            return;
        };

        let inserted = facade
            .insert_one("users", doc! { "name": "a" }, None)
            .await
            .unwrap();
        assert!(inserted.inserted_id.as_object_id().is_some());

        let found: Document =
            check_found(facade.find_one("users", doc! { "name": "a" }, None).await).unwrap();
        assert_eq!(found.get("_id"), Some(&inserted.inserted_id));
        assert_eq!(found.get_str("name").unwrap(), "a");

        let deleted = facade
            .delete_one("users", doc! { "name": "a" }, None)
            .await
            .unwrap();
        assert_eq!(deleted.deleted_count, 1);

        let missing = facade
            .find_one::<Document>("users", doc! { "name": "a" }, None)
            .await;
        let err = check_found(missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("NOT_FOUND: "));

        drop_database(facade).await;
    }

    #[tokio::test]
    async fn test_insert_many_and_find_with_options() {
        let Some(facade) = live_facade().await else {
            return;
        };

        let users = vec![User::new("ann", 31), User::new("bob", 25), User::new("cid", 40)];
        let result = facade.insert_many("users", users, None).await.unwrap();
        assert_eq!(result.inserted_ids.len(), 3);

        let options = QueryOptions::builder()
            .sort(doc! { "age": 1 })
            .limit(2)
            .build();
        let cursor = facade
            .find::<User>("users", doc! {}, Some(options.into()))
            .await
            .unwrap();
        let names: Vec<String> = collect(cursor)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["bob".to_string(), "ann".to_string()]);

        let projected = QueryOptions::builder().fields(["name"]).build();
        let doc: Document = check_found(
            facade
                .find_one("users", doc! { "name": "cid" }, Some(projected.into()))
                .await,
        )
        .unwrap();
        assert!(doc.get("age").is_none());
        assert_eq!(doc.get_str("name").unwrap(), "cid");

        let cursor = facade
            .find::<User>("users", doc! {}, None)
            .await
            .unwrap();
        assert_eq!(collect_limited(cursor, 1).await.unwrap().len(), 1);

        drop_database(facade).await;
    }

    #[tokio::test]
    async fn test_updates_and_count() {
        let Some(facade) = live_facade().await else {
            return;
        };

        let users = vec![User::new("ann", 31), User::new("bob", 25), User::new("cid", 40)];
        facade.insert_many("users", users, None).await.unwrap();

        let one = facade
            .update_one(
                "users",
                doc! { "name": "ann" },
                doc! { "$set": { "age": 32 } },
                None,
            )
            .await
            .unwrap();
        assert_eq!(one.matched_count, 1);
        assert_eq!(one.modified_count, 1);

        let many = facade
            .update_many(
                "users",
                doc! { "age": { "$gte": 30 } },
                doc! { "$set": { "senior": true } },
                None,
            )
            .await
            .unwrap();
        assert_eq!(many.modified_count, 2);

        let upsert = facade
            .update_one(
                "users",
                doc! { "name": "dee" },
                doc! { "$set": { "age": 19 } },
                Some(UpdateOptions::builder().upsert(true).build()),
            )
            .await
            .unwrap();
        assert!(upsert.upserted_id.is_some());

        let seniors = facade
            .count_documents("users", doc! { "senior": true }, None)
            .await
            .unwrap();
        assert_eq!(seniors, 2);

        let after: Option<User> = facade
            .find_one_and_update(
                "users",
                doc! { "name": "bob" },
                doc! { "$inc": { "age": 1 } },
                Some(
                    FindOneAndUpdateOptions::builder()
                        .return_document(ReturnDocument::After)
                        .build(),
                ),
            )
            .await
            .unwrap();
        assert_eq!(after.map(|u| u.age), Some(26));

        let removed = facade
            .delete_many("users", doc! { "senior": true }, None)
            .await
            .unwrap();
        assert_eq!(removed.deleted_count, 2);
        assert_eq!(
            facade.count_documents("users", doc! {}, None).await.unwrap(),
            2
        );

        drop_database(facade).await;
    }

    #[tokio::test]
    async fn test_aggregate() {
        let Some(facade) = live_facade().await else {
            return;
        };

        facade
            .insert_many(
                "orders",
                vec![
                    doc! { "status": "paid", "total": 10 },
                    doc! { "status": "paid", "total": 5 },
                    doc! { "status": "open", "total": 7 },
                ],
                None,
            )
            .await
            .unwrap();

        let pipeline = vec![
            doc! { "$match": { "status": "paid" } },
            doc! { "$group": { "_id": "$status", "sum": { "$sum": "$total" } } },
        ];
        let cursor = facade.aggregate("orders", pipeline, None).await.unwrap();
        let groups = collect(cursor).await.unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].get_str("_id").unwrap(), "paid");
        assert_eq!(groups[0].get_i32("sum").unwrap(), 15);

        drop_database(facade).await;
    }

    #[tokio::test]
    async fn test_duplicate_key_is_labeled() {
        let Some(facade) = live_facade().await else {
            return;
        };

        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        facade
            .get_collection::<Document>("users")
            .create_index(index)
            .await
            .unwrap();

        let user = User::new("ann", 31);
        facade.insert_one("users", user.clone(), None).await.unwrap();

        let err = check_mongo_error(facade.insert_one("users", user.clone(), None).await).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexDuplicated);
        assert!(err.to_string().starts_with("INDEX_DUPLICATED: "));

        let err = check_mongo_error(
            facade
                .insert_many("users", vec![User::new("bob", 1), user.clone()], None)
                .await,
        )
        .unwrap_err();
        assert!(err.is_duplicate_key());

        drop_database(facade).await;
    }

    #[tokio::test]
    async fn test_ping_and_list_collections() {
        let Some(facade) = live_facade().await else {
            return;
        };

        facade.ping().await.unwrap();

        let stats = facade
            .handle()
            .run_command(doc! { "dbStats": 1 })
            .await
            .unwrap();
        assert_eq!(stats.get_str("db").unwrap(), facade.database_name());
        facade
            .insert_one("events", doc! { "kind": "boot" }, None)
            .await
            .unwrap();

        let names = facade.handle().list_collection_names().await.unwrap();
        assert_eq!(names, vec!["events".to_string()]);

        drop_database(facade).await;
    }

    #[tokio::test]
    async fn test_debug_flag_does_not_change_results() {
        let Some(facade) = live_facade().await else {
            return;
        };

        facade
            .insert_many(
                "users",
                vec![User::new("ann", 31), User::new("bob", 25)],
                None,
            )
            .await
            .unwrap();

        let logged = facade.clone().with_debug(true);
        let quiet = facade.clone().with_debug(false);

        let logged_user: Option<User> = logged
            .find_one("users", doc! { "name": "ann" }, None)
            .await
            .unwrap();
        let quiet_user: Option<User> = quiet
            .find_one("users", doc! { "name": "ann" }, None)
            .await
            .unwrap();
        assert_eq!(logged_user, quiet_user);
        assert_eq!(logged_user.map(|u| u.age), Some(31));

        let logged_count = logged
            .count_documents("users", doc! { "age": { "$gt": 20 } }, None)
            .await
            .unwrap();
        let quiet_count = quiet
            .count_documents("users", doc! { "age": { "$gt": 20 } }, None)
            .await
            .unwrap();
        assert_eq!(logged_count, quiet_count);
        assert_eq!(logged_count, 2);

        let logged_missing = check_found(
            logged
                .find_one::<User>("users", doc! { "name": "zed" }, None)
                .await,
        )
        .unwrap_err();
        let quiet_missing = check_found(
            quiet
                .find_one::<User>("users", doc! { "name": "zed" }, None)
                .await,
        )
        .unwrap_err();
        assert_eq!(logged_missing.to_string(), quiet_missing.to_string());

        drop_database(facade).await;
    }
}
