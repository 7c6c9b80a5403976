//! Collection-group accessor
//!
//! A collection group spans every collection sharing one id, wherever it is
//! nested. Queries run across all of them; point operations need the parent
//! path to pin down a single document.

use super::collection_reference::CollectionGroupQuery;
use super::document_reference::DocumentReference;
use super::field_value::Record;
use super::filter::{FilterQuery, OrderBy};
use super::firestore::Firestore;
use super::query::Query;
use super::rest::RestStore;
use super::result::{FirestoreResult, MultiResult};
use super::store::DocumentStore;
use crate::error::{FirebaseError, FirestoreError};
use futures::TryStreamExt;

/// Accessor bound to one project and collection-group id
pub struct CollectionGroup<S = RestStore> {
    query: CollectionGroupQuery<S>,
}

impl<S> Clone for CollectionGroup<S> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
        }
    }
}

impl<S: DocumentStore> CollectionGroup<S> {
    /// Bind `firestore` to every collection named `group_name`
    ///
    /// # Errors
    /// `FirestoreError::InvalidArgument` if `group_name` is empty or
    /// contains a `/`.
    pub fn new(firestore: &Firestore<S>, group_name: impl Into<String>) -> Result<Self, FirebaseError> {
        let group_name = group_name.into();
        if group_name.is_empty() || group_name.contains('/') {
            return Err(FirestoreError::InvalidArgument(format!(
                "collection group id '{}' must be a single non-empty segment",
                group_name
            ))
            .into());
        }
        Ok(Self {
            query: firestore.collection_group(group_name),
        })
    }

    /// Project the group belongs to
    pub fn project(&self) -> &str {
        self.query.firestore().project_id()
    }

    /// Collection-group id
    pub fn name(&self) -> &str {
        self.query.id()
    }

    /// Path of the document `id` under `parent_path`
    ///
    /// `parent_path` is either the parent document (`"users/a"`) or the
    /// collection itself (`"users/a/posts"`); both resolve to
    /// `"users/a/posts/{id}"`.
    pub fn document_path(&self, id: &str, parent_path: &str) -> Result<String, FirebaseError> {
        let parent = parent_path.trim_matches('/');
        let segments: Vec<&str> = if parent.is_empty() {
            Vec::new()
        } else {
            parent.split('/').collect()
        };
        if segments.iter().any(|s| s.is_empty()) || id.is_empty() || id.contains('/') {
            return Err(FirestoreError::InvalidArgument(format!(
                "invalid document '{}' under '{}'",
                id, parent_path
            ))
            .into());
        }

        // even segment counts name a document, odd ones a collection
        if segments.len() % 2 == 0 {
            if parent.is_empty() {
                return Ok(format!("{}/{}", self.name(), id));
            }
            return Ok(format!("{}/{}/{}", parent, self.name(), id));
        }
        if segments.last() != Some(&self.name()) {
            return Err(FirestoreError::InvalidArgument(format!(
                "'{}' is not a '{}' collection",
                parent_path,
                self.name()
            ))
            .into());
        }
        Ok(format!("{}/{}", parent, id))
    }

    /// Reference to the document `id` under `parent_path`
    pub fn document(&self, id: &str, parent_path: &str) -> Result<DocumentReference<S>, FirebaseError> {
        let path = self.document_path(id, parent_path)?;
        Ok(self.query.firestore().document(path))
    }

    /// Every record in every collection of the group
    pub async fn get_all(&self) -> Result<MultiResult, FirebaseError> {
        MultiResult::from_stream(self.query.stream()).await
    }

    /// Records across the group matching `filter_query`, ordered and limited
    ///
    /// Same composition rules as [`Collection::search`](super::collection::Collection::search).
    pub async fn search(
        &self,
        filter_query: impl Into<FilterQuery>,
        order_by: Option<OrderBy>,
        limit: Option<u32>,
    ) -> Result<MultiResult, FirebaseError> {
        let query = self.query.clone().search(filter_query.into(), order_by, limit);
        MultiResult::from_stream(query.stream()).await
    }

    /// The record `id` under `parent_path`, or `None` if there is none
    pub async fn get_one(&self, id: &str, parent_path: &str) -> Result<Option<FirestoreResult>, FirebaseError> {
        let snapshot = self.document(id, parent_path)?.get().await?;
        Ok(FirestoreResult::from_snapshot(snapshot))
    }

    /// Merge `field_updates` into the record `id` under `parent_path`
    ///
    /// # Errors
    /// `FirestoreError::NotFound` if there is no such record.
    pub async fn update(&self, id: &str, parent_path: &str, field_updates: Record) -> Result<(), FirebaseError> {
        self.document(id, parent_path)?.update(field_updates).await
    }

    /// First record in the group whose id is `id`, without knowing its parent
    ///
    /// Scans the group in store order and stops at the first match, so the
    /// cost grows with the size of the group. Prefer [`get_one`](Self::get_one)
    /// when the parent path is known.
    pub async fn get_first_from_stream(&self, id: &str) -> Result<Option<FirestoreResult>, FirebaseError> {
        let mut stream = self.query.stream();
        while let Some(snapshot) = stream.try_next().await? {
            if snapshot.id() == id {
                if let Some(result) = FirestoreResult::from_snapshot(snapshot) {
                    return Ok(Some(result));
                }
            }
        }
        Ok(None)
    }
}

impl<S> std::fmt::Debug for CollectionGroup<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionGroup")
            .field("project", &self.query.firestore.inner.project_id)
            .field("name", &self.query.state.collection_id)
            .finish()
    }
}
