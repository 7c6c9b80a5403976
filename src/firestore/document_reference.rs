//! Firestore DocumentReference type

use super::collection_reference::CollectionReference;
use super::document_snapshot::{document_id, DocumentSnapshot};
use super::field_value::Record;
use super::firestore::Firestore;
use super::store::DocumentStore;
use crate::error::FirebaseError;

/// Reference to a Firestore document
pub struct DocumentReference<S> {
    /// Full document path (e.g., "users/alice")
    pub path: String,
    /// Client the reference operates through
    pub(crate) firestore: Firestore<S>,
}

impl<S> Clone for DocumentReference<S> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            firestore: self.firestore.clone(),
        }
    }
}

impl<S: DocumentStore> DocumentReference<S> {
    /// Create a new document reference
    pub(crate) fn new(path: impl Into<String>, firestore: Firestore<S>) -> Self {
        Self {
            path: path.into().trim_matches('/').to_string(),
            firestore,
        }
    }

    /// Get the document ID (last segment of path)
    pub fn id(&self) -> &str {
        document_id(&self.path)
    }

    /// Get the parent collection path
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }

    /// Get a subcollection of this document
    pub fn collection(&self, collection_id: impl AsRef<str>) -> CollectionReference<S> {
        let path = format!("{}/{}", self.path, collection_id.as_ref());
        CollectionReference::new(path, self.firestore.clone())
    }

    /// Get the document snapshot
    ///
    /// A missing document is a snapshot whose `data` is `None`, not an error.
    pub async fn get(&self) -> Result<DocumentSnapshot, FirebaseError> {
        self.firestore.store().get_document(&self.path).await
    }

    /// Update document fields
    ///
    /// Keys may be dotted paths into nested maps. Fields not named are left
    /// untouched.
    ///
    /// # Errors
    /// `FirestoreError::NotFound` if the document does not exist.
    pub async fn update(&self, data: Record) -> Result<(), FirebaseError> {
        self.firestore.store().update_document(&self.path, data).await
    }

    /// Delete the document
    ///
    /// Deleting a document that does not exist succeeds.
    pub async fn delete(&self) -> Result<(), FirebaseError> {
        self.firestore.store().delete_document(&self.path).await
    }
}

impl<S> std::fmt::Debug for DocumentReference<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReference")
            .field("path", &self.path)
            .field("project_id", &self.firestore.inner.project_id)
            .field("database_id", &self.firestore.inner.database_id)
            .finish()
    }
}

impl<S> PartialEq for DocumentReference<S> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && std::sync::Arc::ptr_eq(&self.firestore.inner, &other.firestore.inner)
    }
}
