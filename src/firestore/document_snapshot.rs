//! Firestore DocumentSnapshot type
//!
//! A snapshot is the raw result of a point read or one element of a query
//! stream: the document path plus its fields, if the document exists.

use super::field_value::{lookup_field, Record};
use serde_json::Value;

/// Raw document as returned by a [`DocumentStore`](super::store::DocumentStore)
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document path relative to the database root (e.g. `"users/alice"`)
    pub path: String,

    /// Document fields (None if the document doesn't exist)
    ///
    /// A document that exists with no fields is `Some` of an empty map.
    pub data: Option<Record>,
}

impl DocumentSnapshot {
    /// Snapshot of an existing document
    pub fn found(path: impl Into<String>, data: Record) -> Self {
        Self {
            path: path.into(),
            data: Some(data),
        }
    }

    /// Snapshot for a path with no document
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: None,
        }
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// Get a field value by dotted path
    pub fn get(&self, field: &str) -> Option<&Value> {
        let Some(data) = &self.data else {
            return None;
        };
        lookup_field(data, field)
    }

    /// Get document ID (last segment of path)
    pub fn id(&self) -> &str {
        document_id(&self.path)
    }

    /// Get the path of the collection holding this document
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }
}

/// Last segment of a slash-separated path
pub(crate) fn document_id(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
