//! Firestore CollectionReference and collection-group query types

use super::document_reference::DocumentReference;
use super::field_value::Record;
use super::firestore::Firestore;
use super::query::{Query, QueryState};
use super::store::DocumentStore;
use crate::error::FirebaseError;

/// Reference to a Firestore collection
///
/// Implements the [`Query`] trait to support filtering, ordering, and
/// limits. Query methods return new references carrying the extended state;
/// point operations ignore it.
pub struct CollectionReference<S> {
    /// Internal query state
    pub(crate) state: QueryState,
    pub(crate) firestore: Firestore<S>,
}

impl<S> Clone for CollectionReference<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            firestore: self.firestore.clone(),
        }
    }
}

impl<S: DocumentStore> CollectionReference<S> {
    /// Create a new collection reference
    pub(crate) fn new(path: impl Into<String>, firestore: Firestore<S>) -> Self {
        Self {
            state: QueryState::collection(&path.into()),
            firestore,
        }
    }

    /// Get collection ID (last segment of path)
    pub fn id(&self) -> &str {
        &self.state.collection_id
    }

    /// Full collection path (e.g., "users/alice/posts")
    pub fn path(&self) -> String {
        self.state.collection_path()
    }

    /// Get a document reference within this collection
    pub fn document(&self, document_id: impl AsRef<str>) -> DocumentReference<S> {
        let path = format!("{}/{}", self.path(), document_id.as_ref());
        DocumentReference::new(path, self.firestore.clone())
    }

    /// Add a new document
    ///
    /// The store generates a 20-character id when `document_id` is `None`.
    ///
    /// # Errors
    /// `FirestoreError::AlreadyExists` if `document_id` is already taken.
    pub async fn add(&self, data: Record, document_id: Option<&str>) -> Result<DocumentReference<S>, FirebaseError> {
        let path = self
            .firestore
            .store()
            .create_document(&self.path(), document_id, data)
            .await?;
        Ok(DocumentReference::new(path, self.firestore.clone()))
    }
}

impl<S: DocumentStore> Query for CollectionReference<S> {
    type Store = S;

    fn query_state(&self) -> &QueryState {
        &self.state
    }

    fn with_state(&self, state: QueryState) -> Self {
        Self {
            state,
            firestore: self.firestore.clone(),
        }
    }

    fn firestore(&self) -> &Firestore<S> {
        &self.firestore
    }
}

impl<S> std::fmt::Debug for CollectionReference<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionReference")
            .field("state", &self.state)
            .field("project_id", &self.firestore.inner.project_id)
            .finish()
    }
}

/// Query over every collection sharing one collection id
///
/// Created by [`Firestore::collection_group`].
pub struct CollectionGroupQuery<S> {
    pub(crate) state: QueryState,
    pub(crate) firestore: Firestore<S>,
}

impl<S> Clone for CollectionGroupQuery<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            firestore: self.firestore.clone(),
        }
    }
}

impl<S: DocumentStore> CollectionGroupQuery<S> {
    pub(crate) fn new(collection_id: impl Into<String>, firestore: Firestore<S>) -> Self {
        Self {
            state: QueryState::collection_group(&collection_id.into()),
            firestore,
        }
    }

    /// Collection id every matched collection ends with
    pub fn id(&self) -> &str {
        &self.state.collection_id
    }
}

impl<S: DocumentStore> Query for CollectionGroupQuery<S> {
    type Store = S;

    fn query_state(&self) -> &QueryState {
        &self.state
    }

    fn with_state(&self, state: QueryState) -> Self {
        Self {
            state,
            firestore: self.firestore.clone(),
        }
    }

    fn firestore(&self) -> &Firestore<S> {
        &self.firestore
    }
}

impl<S> std::fmt::Debug for CollectionGroupQuery<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionGroupQuery")
            .field("state", &self.state)
            .field("project_id", &self.firestore.inner.project_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::filter::{Direction, Operator};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_add_with_and_without_id() {
        let firestore = Firestore::in_memory("demo");
        let users = firestore.collection("users");

        let alice = users.add(record(json!({"name": "Alice"})), Some("alice")).await.unwrap();
        assert_eq!(alice.path, "users/alice");

        let generated = users.add(record(json!({"name": "Bob"})), None).await.unwrap();
        assert_eq!(generated.parent_path(), Some("users"));
        assert_eq!(generated.id().len(), 20);

        let err = users.add(Record::new(), Some("alice")).await.unwrap_err();
        assert!(matches!(
            err,
            FirebaseError::Firestore(crate::error::FirestoreError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_query_methods_keep_collection() {
        let firestore = Firestore::in_memory("demo");
        let users = firestore.collection("users");
        for (id, age) in [("a", 30), ("b", 25), ("c", 41)] {
            users.add(record(json!({"age": age})), Some(id)).await.unwrap();
        }

        let older = users
            .clone()
            .where_field("age", Operator::GreaterThan, 26)
            .order_by("age", Direction::Descending)
            .limit(1)
            .get()
            .await
            .unwrap();
        let ids: Vec<_> = older.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["c"]);
        assert_eq!(users.get().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_collection_group_spans_parents() {
        let firestore = Firestore::in_memory("demo");
        firestore
            .collection("users/a/posts")
            .add(record(json!({"n": 1})), Some("p1"))
            .await
            .unwrap();
        firestore
            .collection("users/b/posts")
            .add(record(json!({"n": 2})), Some("p2"))
            .await
            .unwrap();
        firestore
            .collection("posts")
            .add(record(json!({"n": 3})), Some("p3"))
            .await
            .unwrap();

        let posts = firestore.collection_group("posts").get().await.unwrap();
        assert_eq!(posts.len(), 3);
        let nested = firestore.collection("users/a/posts").get().await.unwrap();
        assert_eq!(nested.len(), 1);
    }
}
