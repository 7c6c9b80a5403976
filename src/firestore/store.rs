//! Document store contract
//!
//! The facade never talks to a backend directly; it drives a
//! [`DocumentStore`] through path-addressed point operations and compiled
//! [`QueryState`]s. [`RestStore`](super::rest::RestStore) speaks to Cloud
//! Firestore, [`MemoryStore`](super::memory::MemoryStore) evaluates the same
//! semantics in process.

use super::document_snapshot::DocumentSnapshot;
use super::field_value::Record;
use super::query::QueryState;
use crate::error::FirebaseError;
use futures::stream::BoxStream;
use std::future::Future;

/// Lazy, single-pass stream of query results
pub type DocumentStream = BoxStream<'static, Result<DocumentSnapshot, FirebaseError>>;

/// Backend operations the client handle needs
///
/// All paths are relative to the database root (`"users/a"`,
/// `"users/a/posts"`). Implementations must be safe to share between any
/// number of handles; callers never lock them.
pub trait DocumentStore: Send + Sync + 'static {
    /// Read one document; a missing document is a snapshot with no data
    fn get_document(&self, path: &str) -> impl Future<Output = Result<DocumentSnapshot, FirebaseError>> + Send;

    /// Create a document in `collection_path`, generating an id when none is given
    ///
    /// Returns the path of the created document. Fails with
    /// `AlreadyExists` if the id is taken.
    fn create_document(
        &self,
        collection_path: &str,
        document_id: Option<&str>,
        data: Record,
    ) -> impl Future<Output = Result<String, FirebaseError>> + Send;

    /// Merge `data` into an existing document
    ///
    /// Only the given top-level fields are written. Fails with `NotFound`
    /// if the document does not exist.
    fn update_document(&self, path: &str, data: Record) -> impl Future<Output = Result<(), FirebaseError>> + Send;

    /// Delete a document; deleting a missing document succeeds
    fn delete_document(&self, path: &str) -> impl Future<Output = Result<(), FirebaseError>> + Send;

    /// Stream the documents matching `query`
    ///
    /// The stream must not contact the backend before it is first polled.
    fn run_query(&self, query: QueryState) -> DocumentStream;
}
