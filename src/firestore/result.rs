//! Result wrappers
//!
//! [`FirestoreResult`] wraps one retrieved record with its id.
//! [`MultiResult`] materializes a whole query stream up front so its views
//! can be taken any number of times without going back to the store.

use super::document_snapshot::DocumentSnapshot;
use super::field_value::Record;
use super::store::DocumentStream;
use crate::error::{FirebaseError, ProjectionError};
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// Key the document id is injected under when `append_id` is requested
pub const ID_KEY: &str = "docId";

/// Types that can be built from a retrieved record
///
/// Every `DeserializeOwned` type gets this for free. Types that must reject
/// fields they do not declare should use `#[serde(deny_unknown_fields)]`.
pub trait Constructible: Sized {
    /// Build a value from a record's fields
    fn from_mapping(record: &Record) -> Result<Self, serde_json::Error>;
}

impl<T: DeserializeOwned> Constructible for T {
    fn from_mapping(record: &Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record.clone()))
    }
}

/// One retrieved record plus its id
#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreResult {
    id: String,
    path: String,
    data: Record,
}

impl FirestoreResult {
    /// Wrap a snapshot; `None` if the document does not exist
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Option<Self> {
        let data = snapshot.data?;
        Some(Self {
            id: super::document_snapshot::document_id(&snapshot.path).to_string(),
            path: snapshot.path,
            data,
        })
    }

    /// Document id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Document path relative to the database root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw fields, without the id
    pub fn data(&self) -> &Record {
        &self.data
    }

    /// Record as a mapping, with the id under `"docId"` when `append_id` is set
    ///
    /// An existing `docId` field is overwritten by the real id.
    pub fn dict(&self, append_id: bool) -> Record {
        let mut record = self.data.clone();
        if append_id {
            record.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        }
        record
    }

    /// Project `dict(true)` into `T`, failing with the reason
    ///
    /// The id is part of the projected fields, so `T` can declare it with
    /// `#[serde(rename = "docId")]`, and types denying unknown fields must
    /// declare it.
    pub fn try_to_class<T: Constructible>(&self) -> Result<T, ProjectionError> {
        self.project(true)
    }

    /// Project into `T`; a record that does not fit yields `None`
    ///
    /// The failure is logged at warn level.
    pub fn to_class<T: Constructible>(&self) -> Option<T> {
        self.try_to_class().map_err(log_projection_error).ok()
    }

    fn project<T: Constructible>(&self, append_id: bool) -> Result<T, ProjectionError> {
        let record = if append_id {
            std::borrow::Cow::Owned(self.dict(true))
        } else {
            std::borrow::Cow::Borrowed(&self.data)
        };
        T::from_mapping(&record).map_err(|source| ProjectionError {
            id: self.id.clone(),
            source,
        })
    }
}

fn log_projection_error(err: ProjectionError) -> ProjectionError {
    tracing::warn!(id = %err.id, error = %err.source, "record does not fit target type");
    err
}

/// Ordered records from one query, materialized at construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiResult {
    results: Vec<FirestoreResult>,
}

impl MultiResult {
    /// Drain a query stream
    ///
    /// Transport and query errors propagate; snapshots without data are
    /// skipped.
    pub async fn from_stream(stream: DocumentStream) -> Result<Self, FirebaseError> {
        let snapshots: Vec<DocumentSnapshot> = stream.try_collect().await?;
        Ok(Self::from_snapshots(snapshots))
    }

    /// Wrap already retrieved snapshots, keeping their order
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = DocumentSnapshot>) -> Self {
        Self {
            results: snapshots.into_iter().filter_map(FirestoreResult::from_snapshot).collect(),
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the query matched nothing
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Record ids in result order
    pub fn ids(&self) -> Vec<&str> {
        self.results.iter().map(FirestoreResult::id).collect()
    }

    /// Iterate over the records in result order
    pub fn iter(&self) -> std::slice::Iter<'_, FirestoreResult> {
        self.results.iter()
    }

    /// First record, if any
    pub fn first(&self) -> Option<&FirestoreResult> {
        self.results.first()
    }

    /// Records as mappings, in result order
    pub fn to_list(&self, append_id: bool) -> Vec<Record> {
        self.results.iter().map(|result| result.dict(append_id)).collect()
    }

    /// Records projected into `T`, in result order
    ///
    /// The first record that does not fit aborts the whole batch.
    pub fn to_list_as<T: Constructible>(&self, append_id: bool) -> Result<Vec<T>, ProjectionError> {
        self.results.iter().map(|result| result.project(append_id)).collect()
    }

    /// Records projected into `T`, skipping (and logging) those that do not fit
    pub fn to_list_lossy<T: Constructible>(&self, append_id: bool) -> Vec<T> {
        self.results
            .iter()
            .filter_map(|result| result.project(append_id).map_err(log_projection_error).ok())
            .collect()
    }

    /// Records keyed by id
    ///
    /// Ids are unique within a collection; across a collection group the
    /// later record wins.
    pub fn to_dict(&self, append_id: bool) -> HashMap<String, Record> {
        self.results
            .iter()
            .map(|result| (result.id.clone(), result.dict(append_id)))
            .collect()
    }

    /// Records projected into `T`, keyed by id; the first failure aborts
    pub fn to_dict_as<T: Constructible>(&self, append_id: bool) -> Result<HashMap<String, T>, ProjectionError> {
        self.results
            .iter()
            .map(|result| Ok((result.id.clone(), result.project(append_id)?)))
            .collect()
    }

    /// Records projected into `T`, keyed by id, skipping those that do not fit
    pub fn to_dict_lossy<T: Constructible>(&self, append_id: bool) -> HashMap<String, T> {
        self.results
            .iter()
            .filter_map(|result| {
                let value = result.project(append_id).map_err(log_projection_error).ok()?;
                Some((result.id.clone(), value))
            })
            .collect()
    }
}

impl IntoIterator for MultiResult {
    type Item = FirestoreResult;
    type IntoIter = std::vec::IntoIter<FirestoreResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiResult {
    type Item = &'a FirestoreResult;
    type IntoIter = std::slice::Iter<'a, FirestoreResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: u32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct StrictUser {
        name: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct UserWithId {
        #[serde(rename = "docId")]
        id: String,
        name: String,
    }

    fn snapshot(path: &str, value: Value) -> DocumentSnapshot {
        DocumentSnapshot::found(path, value.as_object().cloned().unwrap())
    }

    fn users() -> MultiResult {
        MultiResult::from_snapshots(vec![
            snapshot("users/a", json!({"name": "Alice", "age": 30})),
            DocumentSnapshot::missing("users/ghost"),
            snapshot("users/b", json!({"name": "Bob", "age": 25})),
        ])
    }

    #[test]
    fn test_dict_appends_id() {
        let result = FirestoreResult::from_snapshot(snapshot("users/a", json!({"name": "Alice"}))).unwrap();
        assert_eq!(Value::Object(result.dict(false)), json!({"name": "Alice"}));
        assert_eq!(Value::Object(result.dict(true)), json!({"name": "Alice", "docId": "a"}));
    }

    #[test]
    fn test_dict_id_overwrites_existing_field() {
        let result = FirestoreResult::from_snapshot(snapshot("users/a", json!({"docId": "stale"}))).unwrap();
        assert_eq!(result.dict(true)[ID_KEY], json!("a"));
        assert_eq!(result.dict(false)[ID_KEY], json!("stale"));
    }

    #[test]
    fn test_missing_snapshot_has_no_result() {
        assert!(FirestoreResult::from_snapshot(DocumentSnapshot::missing("users/a")).is_none());
    }

    #[test]
    fn test_to_class() {
        let result = FirestoreResult::from_snapshot(snapshot("users/a", json!({"name": "Alice", "age": 30}))).unwrap();
        assert_eq!(
            result.to_class::<User>(),
            Some(User {
                name: "Alice".to_string(),
                age: 30
            })
        );
        assert_eq!(result.to_class::<StrictUser>(), None);

        let err = result.try_to_class::<StrictUser>().unwrap_err();
        assert_eq!(err.id, "a");
    }

    #[test]
    fn test_to_class_includes_id() {
        let result = FirestoreResult::from_snapshot(snapshot("users/a", json!({"name": "Alice"}))).unwrap();
        assert_eq!(
            result.to_class::<UserWithId>(),
            Some(UserWithId {
                id: "a".to_string(),
                name: "Alice".to_string()
            })
        );
        // the injected id is an extra field for a type that only declares the stored ones
        assert_eq!(result.to_class::<StrictUser>(), None);
        assert!(result.try_to_class::<StrictUser>().unwrap_err().to_string().contains("docId"));
    }

    #[test]
    fn test_to_list_keeps_order_and_skips_missing() {
        let results = users();
        assert_eq!(results.len(), 2);
        assert_eq!(results.ids(), vec!["a", "b"]);

        let list = results.to_list(true);
        assert_eq!(list[0]["name"], json!("Alice"));
        assert_eq!(list[1][ID_KEY], json!("b"));
        // repeatable without refetching
        assert_eq!(results.to_list(true), list);
    }

    #[test]
    fn test_to_list_as_with_id() {
        let typed: Vec<UserWithId> = users().to_list_as(true).unwrap();
        assert_eq!(typed[0].id, "a");
        assert_eq!(typed[1].name, "Bob");
    }

    #[test]
    fn test_to_list_as_aborts_but_lossy_skips() {
        let results = MultiResult::from_snapshots(vec![
            snapshot("users/a", json!({"name": "Alice", "age": 30})),
            snapshot("users/b", json!({"name": "Bob"})),
        ]);
        let err = results.to_list_as::<User>(false).unwrap_err();
        assert_eq!(err.id, "b");

        let lossy: Vec<User> = results.to_list_lossy(false);
        assert_eq!(lossy.len(), 1);
        assert_eq!(lossy[0].name, "Alice");
    }

    #[test]
    fn test_to_dict() {
        let dict = users().to_dict(false);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict["b"]["age"], json!(25));

        let typed: HashMap<String, User> = users().to_dict_as(false).unwrap();
        assert_eq!(typed["a"].age, 30);

        let strict: HashMap<String, StrictUser> = users().to_dict_lossy(false);
        assert!(strict.is_empty());
    }

    #[test]
    fn test_to_dict_later_record_wins() {
        let results = MultiResult::from_snapshots(vec![
            snapshot("users/a/posts/p1", json!({"n": 1})),
            snapshot("users/b/posts/p1", json!({"n": 2})),
        ]);
        let dict = results.to_dict(false);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict["p1"]["n"], json!(2));
    }

    #[tokio::test]
    async fn test_from_stream_propagates_errors() {
        let ok: DocumentStream = Box::pin(futures::stream::iter(vec![Ok::<_, FirebaseError>(snapshot("users/a", json!({})))]));
        assert_eq!(MultiResult::from_stream(ok).await.unwrap().len(), 1);

        let failing: DocumentStream = Box::pin(futures::stream::iter(vec![
            Ok::<_, FirebaseError>(snapshot("users/a", json!({}))),
            Err(FirebaseError::internal("connection reset")),
        ]));
        assert!(MultiResult::from_stream(failing).await.is_err());
    }
}
