//! Firestore client handle
//!
//! A [`Firestore`] is a cheap, cloneable handle over a shared
//! [`DocumentStore`]. It hands out collection, collection-group, and
//! document references that run their operations against that store.

use super::collection_reference::{CollectionGroupQuery, CollectionReference};
use super::document_reference::DocumentReference;
use super::memory::MemoryStore;
use super::rest::RestStore;
use super::settings::ClientConfig;
use super::store::DocumentStore;
use crate::error::FirebaseError;
use std::sync::Arc;

/// Firestore database client
///
/// The store is shared through an `Arc`; clones of the handle and every
/// reference derived from it use the same connection pool.
pub struct Firestore<S = RestStore> {
    pub(crate) inner: Arc<FirestoreInner<S>>,
}

pub(crate) struct FirestoreInner<S> {
    pub(crate) project_id: String,
    pub(crate) database_id: String,
    pub(crate) store: S,
}

// derive(Clone) would require S: Clone
impl<S> Clone for Firestore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Firestore<RestStore> {
    /// Create a client for Cloud Firestore (or an emulator)
    ///
    /// Credentials named by `config` are loaded here; the first request is
    /// sent lazily by the first operation.
    ///
    /// # Example
    /// ```no_run
    /// # use firestore_facade::firestore::{ClientConfig, Firestore};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let firestore = Firestore::connect(ClientConfig::emulator("demo", "localhost:8080")).await?;
    /// let users = firestore.collection("users");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: ClientConfig) -> Result<Self, FirebaseError> {
        let store = RestStore::connect(&config).await?;
        tracing::info!(
            project_id = %config.project_id,
            database_id = %config.database_id,
            host = %config.settings.host,
            "firestore client created"
        );
        Ok(Self::from_parts(config.project_id, config.database_id, store))
    }

    /// Create a client configured from the process environment
    ///
    /// See [`ClientConfig::from_env`].
    pub async fn from_env(project_id: impl Into<String>) -> Result<Self, FirebaseError> {
        Self::connect(ClientConfig::from_env(project_id)).await
    }
}

impl Firestore<MemoryStore> {
    /// Create a client over an empty in-process store
    pub fn in_memory(project_id: impl Into<String>) -> Self {
        Self::with_store(project_id, MemoryStore::new())
    }
}

impl<S: DocumentStore> Firestore<S> {
    /// Create a client over any store, using the default database
    pub fn with_store(project_id: impl Into<String>, store: S) -> Self {
        Self::from_parts(project_id.into(), super::settings::DEFAULT_DATABASE.to_string(), store)
    }

    fn from_parts(project_id: String, database_id: String, store: S) -> Self {
        Self {
            inner: Arc::new(FirestoreInner {
                project_id,
                database_id,
                store,
            }),
        }
    }

    /// Get the project ID
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Get the database ID
    pub fn database_id(&self) -> &str {
        &self.inner.database_id
    }

    /// Store the client runs against
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Get a reference to a document
    ///
    /// # Arguments
    /// * `path` - Document path (e.g., "users/alice")
    pub fn document(&self, path: impl Into<String>) -> DocumentReference<S> {
        DocumentReference::new(path, self.clone())
    }

    /// Get a reference to a collection
    ///
    /// # Arguments
    /// * `path` - Collection path (e.g., "users" or "users/alice/posts")
    pub fn collection(&self, path: impl Into<String>) -> CollectionReference<S> {
        CollectionReference::new(path, self.clone())
    }

    /// Create a collection group query
    ///
    /// Matches every collection or subcollection whose last path segment is
    /// `collection_id`:
    /// - `/posts/{postId}`
    /// - `/users/{userId}/posts/{postId}`
    /// - `/groups/{groupId}/posts/{postId}`
    ///
    /// # Panics
    /// Panics if `collection_id` contains a `/`.
    pub fn collection_group(&self, collection_id: impl Into<String>) -> CollectionGroupQuery<S> {
        let collection_id = collection_id.into();
        assert!(!collection_id.contains('/'), "collection_id must not contain '/'");
        CollectionGroupQuery::new(collection_id, self.clone())
    }
}

impl<S> std::fmt::Debug for Firestore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.inner.project_id)
            .field("database_id", &self.inner.database_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_to_emulator_is_lazy() {
        // no emulator needs to be listening: nothing is sent yet
        let firestore = Firestore::connect(ClientConfig::emulator("test-project", "localhost:8080"))
            .await
            .unwrap();
        assert_eq!(firestore.project_id(), "test-project");
        assert_eq!(firestore.database_id(), "(default)");
    }

    #[test]
    fn test_clones_share_store() {
        let firestore = Firestore::in_memory("demo");
        let clone = firestore.clone();
        assert!(Arc::ptr_eq(&firestore.inner, &clone.inner));
    }

    #[test]
    fn test_references() {
        let firestore = Firestore::in_memory("demo");
        assert_eq!(firestore.document("users/alice").id(), "alice");
        assert_eq!(firestore.collection("users/alice/posts").id(), "posts");
        assert_eq!(firestore.collection_group("posts").id(), "posts");
    }

    #[test]
    #[should_panic(expected = "must not contain")]
    fn test_collection_group_rejects_slash() {
        Firestore::in_memory("demo").collection_group("users/posts");
    }
}
