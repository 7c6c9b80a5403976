//! Collection accessor
//!
//! [`Collection`] binds a client to one collection path and offers the
//! everyday CRUD and search operations in terms of ids, filters, and the
//! result wrappers.

use super::collection_reference::CollectionReference;
use super::document_reference::DocumentReference;
use super::field_value::Record;
use super::filter::{FilterQuery, OrderBy};
use super::firestore::Firestore;
use super::query::Query;
use super::rest::RestStore;
use super::result::{FirestoreResult, MultiResult};
use super::store::DocumentStore;
use crate::error::{FirebaseError, FirestoreError};

/// Accessor bound to one project and collection
///
/// Cheap to clone; clones share the client.
///
/// # Example
/// ```
/// # use firestore_facade::{Collection, Filter};
/// # use firestore_facade::firestore::Firestore;
/// # use serde_json::json;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let firestore = Firestore::in_memory("demo");
/// let users = Collection::new(&firestore, "users");
///
/// let data = json!({"name": "Alice", "age": 30}).as_object().cloned().unwrap();
/// users.add(data, Some("alice")).await?;
///
/// let adults = users.search(Filter::new("age", ">=", json!(18))?, None, None).await?;
/// assert_eq!(adults.ids(), vec!["alice"]);
/// # Ok(())
/// # }
/// ```
pub struct Collection<S = RestStore> {
    reference: CollectionReference<S>,
}

impl<S> Clone for Collection<S> {
    fn clone(&self) -> Self {
        Self {
            reference: self.reference.clone(),
        }
    }
}

impl<S: DocumentStore> Collection<S> {
    /// Bind `firestore` to the collection at `collection_name`
    ///
    /// `collection_name` may be a nested collection path such as
    /// `"users/alice/posts"`.
    pub fn new(firestore: &Firestore<S>, collection_name: impl Into<String>) -> Self {
        Self {
            reference: firestore.collection(collection_name),
        }
    }

    /// Project the collection belongs to
    pub fn project(&self) -> &str {
        self.reference.firestore().project_id()
    }

    /// Collection path
    pub fn name(&self) -> String {
        self.reference.path()
    }

    /// Reference to the document with `id`
    ///
    /// # Errors
    /// `FirestoreError::InvalidArgument` if `id` is empty or contains a `/`.
    pub fn document(&self, id: &str) -> Result<DocumentReference<S>, FirebaseError> {
        check_document_id(id)?;
        Ok(self.reference.document(id))
    }

    /// Every record in the collection, in store order
    pub async fn get_all(&self) -> Result<MultiResult, FirebaseError> {
        MultiResult::from_stream(self.reference.stream()).await
    }

    /// Records matching `filter_query`, ordered and limited
    ///
    /// A list of filters is a conjunction. The ordering is applied after the
    /// filters and the limit after the ordering; `None` (or a zero limit)
    /// leaves that part out. Combinations the store cannot serve, such as
    /// range filters on two fields, fail with the store's error.
    pub async fn search(
        &self,
        filter_query: impl Into<FilterQuery>,
        order_by: Option<OrderBy>,
        limit: Option<u32>,
    ) -> Result<MultiResult, FirebaseError> {
        let query = self.reference.clone().search(filter_query.into(), order_by, limit);
        MultiResult::from_stream(query.stream()).await
    }

    /// The record with `id`, or `None` if there is none
    pub async fn get_one(&self, id: &str) -> Result<Option<FirestoreResult>, FirebaseError> {
        let snapshot = self.document(id)?.get().await?;
        Ok(FirestoreResult::from_snapshot(snapshot))
    }

    /// Whether a record with `id` exists
    pub async fn is_document_exists(&self, id: &str) -> Result<bool, FirebaseError> {
        Ok(self.get_one(id).await?.is_some())
    }

    /// Merge `field_updates` into the record with `id`
    ///
    /// # Errors
    /// `FirestoreError::NotFound` if there is no such record.
    pub async fn update(&self, id: &str, field_updates: Record) -> Result<(), FirebaseError> {
        self.document(id)?.update(field_updates).await
    }

    /// Create a record, generating an id when `id` is `None`
    pub async fn add(&self, fields: Record, id: Option<&str>) -> Result<DocumentReference<S>, FirebaseError> {
        if let Some(id) = id {
            check_document_id(id)?;
        }
        self.reference.add(fields, id).await
    }

    /// Delete the record with `id`; succeeds if it does not exist
    pub async fn delete(&self, id: &str) -> Result<(), FirebaseError> {
        self.document(id)?.delete().await
    }

    /// Delete the document at a full path (e.g. `"users/a"`), ignoring this collection
    pub async fn delete_by_path(&self, path: &str) -> Result<(), FirebaseError> {
        self.reference.firestore().document(path).delete().await
    }
}

/// Ids name a single document directly under the collection
fn check_document_id(id: &str) -> Result<(), FirebaseError> {
    if id.is_empty() || id.contains('/') {
        return Err(FirestoreError::InvalidArgument(format!("invalid document id '{}'", id)).into());
    }
    Ok(())
}

impl<S> std::fmt::Debug for Collection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("project", &self.reference.firestore.inner.project_id)
            .field("name", &self.reference.state.collection_path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::filter::Filter;
    use crate::firestore::memory::MemoryStore;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn users() -> Collection<MemoryStore> {
        Collection::new(&Firestore::in_memory("demo"), "users")
    }

    #[test]
    fn test_accessors() {
        let users = users();
        assert_eq!(users.project(), "demo");
        assert_eq!(users.name(), "users");
        assert_eq!(users.document("a").unwrap().path, "users/a");
    }

    #[tokio::test]
    async fn test_nested_ids_rejected() {
        let users = users();
        users.add(record(json!({"name": "Alice"})), Some("a")).await.unwrap();
        users
            .document("a")
            .unwrap()
            .collection("posts")
            .add(record(json!({"title": "Hello"})), Some("p1"))
            .await
            .unwrap();

        for id in ["a/posts/p1", "a/posts", "", "a/"] {
            let err = users.get_one(id).await.unwrap_err();
            assert!(matches!(err, FirebaseError::Firestore(FirestoreError::InvalidArgument(_))), "{id}");
        }
        assert!(users.update("a/posts/p1", record(json!({"likes": 1}))).await.is_err());
        assert!(users.delete("a/posts/p1").await.is_err());
        assert!(users.add(record(json!({})), Some("x/y")).await.is_err());
        // the nested document is untouched
        assert!(users.document("a").unwrap().collection("posts").document("p1").get().await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_get_one_missing_is_none() {
        let users = users();
        assert!(users.get_one("nobody").await.unwrap().is_none());
        assert!(!users.is_document_exists("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_on_empty_collection() {
        let results = users().search(Filter::equal("name", "Alice"), None, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_path() {
        let users = users();
        users.add(record(json!({"name": "Alice"})), Some("a")).await.unwrap();
        users.delete_by_path("users/a").await.unwrap();
        assert!(!users.is_document_exists("a").await.unwrap());
        users.delete_by_path("users/a").await.unwrap();
    }
}
