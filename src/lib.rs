//! Firestore data-access facade
//!
//! Declarative search and CRUD over Cloud Firestore collections and
//! collection groups, with results shaped as mappings, id-keyed mappings,
//! or typed values.
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use firestore_facade::{Collection, Filter, OrderBy};
//! use firestore_facade::firestore::Firestore;
//! use serde_json::json;
//!
//! let firestore = Firestore::from_env("my-project").await?;
//! let users = Collection::new(&firestore, "users");
//!
//! let adults = users
//!     .search(Filter::new("age", ">=", json!(18))?, Some(OrderBy::new("age")), Some(20))
//!     .await?;
//! for user in adults.to_list(true) {
//!     println!("{}", user["docId"]);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod firestore;

// Re-exports for convenience
pub use error::{FirebaseError, FirestoreError, ProjectionError};

pub use firestore::{
    Collection, CollectionGroup, Constructible, Filter, FilterQuery, FirestoreResult, MultiResult, Operator,
    OrderBy, Record,
};
