//! Cloud Firestore module
//!
//! Layout, leaf first:
//! - `field_value.rs` record type and Firestore value ordering
//! - `filter.rs` Filter, Operator, OrderBy
//! - `document_snapshot.rs` raw store results
//! - `store.rs` the `DocumentStore` contract, implemented by `rest.rs` and `memory.rs`
//! - `settings.rs` / `credentials.rs` client provisioning
//! - `firestore.rs`, `collection_reference.rs`, `document_reference.rs`, `query.rs` client handle
//! - `result.rs`, `collection.rs`, `collection_group.rs` the accessor facade

pub mod collection;
pub mod collection_group;
pub mod collection_reference;
pub(crate) mod credentials;
pub mod document_reference;
pub mod document_snapshot;
pub mod field_value;
pub mod filter;
/// Core Firestore client handle
pub mod firestore;
pub mod memory;
pub mod query;
pub mod rest;
pub mod result;
pub mod settings;
pub mod store;
pub(crate) mod wire;

// Re-export main Firestore client
pub use firestore::Firestore;

pub use collection::Collection;
pub use collection_group::CollectionGroup;
pub use collection_reference::{CollectionGroupQuery, CollectionReference};
pub use document_reference::DocumentReference;
pub use document_snapshot::DocumentSnapshot;
pub use field_value::Record;
pub use filter::{Direction, Filter, FilterQuery, Operator, OrderBy};
pub use memory::MemoryStore;
pub use query::{Query, QueryState};
pub use rest::RestStore;
pub use result::{Constructible, FirestoreResult, MultiResult, ID_KEY};
pub use settings::{ClientConfig, CredentialsSource, Settings};
pub use store::{DocumentStore, DocumentStream};
