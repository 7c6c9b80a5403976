//! In-process document store
//!
//! Evaluates paths, filters, orderings, and limits with Firestore's
//! semantics, including its rejection of range filters on more than one
//! field. Used for tests, benchmarks, and local development without a
//! backend.

use super::document_snapshot::DocumentSnapshot;
use super::field_value::{compare_values, lookup_field, same_type_class, set_field, values_equal, Record};
use super::filter::{Direction, Filter, Operator, OrderBy};
use super::query::QueryState;
use super::store::{DocumentStore, DocumentStream};
use crate::error::{FirebaseError, FirestoreError};
use async_stream::stream;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const AUTO_ID_LENGTH: usize = 20;

/// Generate a 20-character alphanumeric document id
pub(crate) fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Document store held entirely in memory
///
/// Cloning is cheap and clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, Record>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(document path, fields)` pairs
    pub fn with_documents<I, P>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, Record)>,
        P: Into<String>,
    {
        let documents = documents
            .into_iter()
            .map(|(path, data)| (path.into().trim_matches('/').to_string(), data))
            .collect();
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }

    /// Number of stored documents across all collections
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

/// Split a path into segments, rejecting empty segments
fn segments(path: &str) -> Result<Vec<&str>, FirebaseError> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(FirestoreError::InvalidArgument(format!("invalid path '{}'", path)).into());
    }
    Ok(segments)
}

fn normalize_document_path(path: &str) -> Result<String, FirebaseError> {
    let segments = segments(path)?;
    if segments.len() % 2 != 0 {
        return Err(FirestoreError::InvalidArgument(format!("'{}' is not a document path", path)).into());
    }
    Ok(segments.join("/"))
}

fn normalize_collection_path(path: &str) -> Result<String, FirebaseError> {
    let segments = segments(path)?;
    if segments.len() % 2 != 1 {
        return Err(FirestoreError::InvalidArgument(format!("'{}' is not a collection path", path)).into());
    }
    Ok(segments.join("/"))
}

impl DocumentStore for MemoryStore {
    async fn get_document(&self, path: &str) -> Result<DocumentSnapshot, FirebaseError> {
        let path = normalize_document_path(path)?;
        let documents = self.documents.read().await;
        Ok(match documents.get(&path) {
            Some(data) => DocumentSnapshot::found(path, data.clone()),
            None => DocumentSnapshot::missing(path),
        })
    }

    async fn create_document(
        &self,
        collection_path: &str,
        document_id: Option<&str>,
        data: Record,
    ) -> Result<String, FirebaseError> {
        let parent = normalize_collection_path(collection_path)?;
        let id = match document_id {
            Some(id) if !id.is_empty() && !id.contains('/') => id.to_string(),
            Some(id) => {
                return Err(FirestoreError::InvalidArgument(format!("invalid document id '{}'", id)).into());
            }
            None => auto_id(),
        };
        let path = format!("{}/{}", parent, id);

        let mut documents = self.documents.write().await;
        if documents.contains_key(&path) {
            return Err(FirestoreError::AlreadyExists.into());
        }
        documents.insert(path.clone(), data);
        Ok(path)
    }

    async fn update_document(&self, path: &str, data: Record) -> Result<(), FirebaseError> {
        let path = normalize_document_path(path)?;
        let mut documents = self.documents.write().await;
        let Some(existing) = documents.get_mut(&path) else {
            return Err(FirestoreError::NotFound.into());
        };
        for (field, value) in data {
            set_field(existing, &field, value);
        }
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<(), FirebaseError> {
        let path = normalize_document_path(path)?;
        self.documents.write().await.remove(&path);
        Ok(())
    }

    fn run_query(&self, query: QueryState) -> DocumentStream {
        let documents = Arc::clone(&self.documents);
        Box::pin(stream! {
            if let Err(err) = validate_query(&query) {
                yield Err(err);
                return;
            }
            let matched = {
                let documents = documents.read().await;
                evaluate(&documents, &query)
            };
            for snapshot in matched {
                yield Ok(snapshot);
            }
        })
    }
}

/// Reject queries the backend would reject
fn validate_query(query: &QueryState) -> Result<(), FirebaseError> {
    let mut range_fields: Vec<&str> = query
        .filters
        .iter()
        .filter(|f| f.operator().is_inequality())
        .map(Filter::field)
        .collect();
    range_fields.sort_unstable();
    range_fields.dedup();
    if range_fields.len() > 1 {
        return Err(FirestoreError::InvalidArgument(format!(
            "cannot have inequality filters on multiple properties: {:?}",
            range_fields
        ))
        .into());
    }

    for filter in &query.filters {
        let needs_array = matches!(
            filter.operator(),
            Operator::In | Operator::NotIn | Operator::ArrayContainsAny
        );
        let is_non_empty_array = filter.value().as_array().is_some_and(|values| !values.is_empty());
        if needs_array && !is_non_empty_array {
            return Err(FirestoreError::InvalidArgument(format!(
                "'{}' filter on '{}' requires a non-empty array",
                filter.operator(),
                filter.field()
            ))
            .into());
        }
    }
    Ok(())
}

/// Whether a document path belongs to the collection(s) the query selects
fn in_scope(path: &str, query: &QueryState) -> bool {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 || segments.len() % 2 != 0 {
        return false;
    }
    let collection_id = segments[segments.len() - 2];
    if collection_id != query.collection_id {
        return false;
    }
    let parent = segments[..segments.len() - 2].join("/");
    if !query.all_descendants {
        return parent == query.parent_path;
    }
    query.parent_path.is_empty()
        || parent == query.parent_path
        || parent.starts_with(&format!("{}/", query.parent_path))
}

fn matches_filter(data: &Record, filter: &Filter) -> bool {
    let Some(field) = lookup_field(data, filter.field()) else {
        return false;
    };
    let value = filter.value();
    let range = |expected: &[Ordering]| same_type_class(field, value) && expected.contains(&compare_values(field, value));

    match filter.operator() {
        Operator::Equal => values_equal(field, value),
        Operator::NotEqual => !field.is_null() && !values_equal(field, value),
        Operator::LessThan => range(&[Ordering::Less]),
        Operator::LessThanOrEqual => range(&[Ordering::Less, Ordering::Equal]),
        Operator::GreaterThan => range(&[Ordering::Greater]),
        Operator::GreaterThanOrEqual => range(&[Ordering::Greater, Ordering::Equal]),
        Operator::ArrayContains => field
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(item, value))),
        Operator::ArrayContainsAny => match (field.as_array(), value.as_array()) {
            (Some(items), Some(candidates)) => items
                .iter()
                .any(|item| candidates.iter().any(|c| values_equal(item, c))),
            _ => false,
        },
        Operator::In => value
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| values_equal(field, c))),
        Operator::NotIn => {
            !field.is_null()
                && value
                    .as_array()
                    .is_some_and(|candidates| !candidates.iter().any(|c| values_equal(field, c)))
        }
    }
}

/// Orderings to apply, with the implicit order on an inequality field
fn effective_orders(query: &QueryState) -> Vec<OrderBy> {
    if !query.orders.is_empty() {
        return query.orders.clone();
    }
    query
        .filters
        .iter()
        .find(|f| f.operator().is_inequality())
        .map(|f| vec![OrderBy::new(f.field())])
        .unwrap_or_default()
}

fn evaluate(documents: &BTreeMap<String, Record>, query: &QueryState) -> Vec<DocumentSnapshot> {
    let orders = effective_orders(query);

    let mut matched: Vec<(&String, &Record)> = documents
        .iter()
        .filter(|(path, _)| in_scope(path, query))
        .filter(|(_, data)| query.filters.iter().all(|f| matches_filter(data, f)))
        // documents missing an ordered field are excluded
        .filter(|(_, data)| orders.iter().all(|o| lookup_field(data, o.field_path()).is_some()))
        .collect();

    matched.sort_by(|(path_a, a), (path_b, b)| {
        for order in &orders {
            let (Some(x), Some(y)) = (lookup_field(a, order.field_path()), lookup_field(b, order.field_path())) else {
                continue;
            };
            let ord = match order.direction() {
                Direction::Ascending => compare_values(x, y),
                Direction::Descending => compare_values(y, x),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        path_a.cmp(path_b)
    });

    if let Some(limit) = query.limit {
        matched.truncate(limit as usize);
    }

    matched
        .into_iter()
        .map(|(path, data)| DocumentSnapshot::found(path.clone(), data.clone()))
        .collect()
}
