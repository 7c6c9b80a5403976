//! Firestore Query trait and implementation
//!
//! Queries are immutable - each method returns a new query with modified
//! state, similar to how Iterator adapters work. Execution hands the compiled
//! [`QueryState`] to the client's [`DocumentStore`].

use super::document_snapshot::DocumentSnapshot;
use super::filter::{Direction, Filter, FilterQuery, Operator, OrderBy};
use super::firestore::Firestore;
use super::store::{DocumentStore, DocumentStream};
use crate::error::FirebaseError;
use futures::TryStreamExt;
use serde_json::Value;

/// Compiled query: which collections to read and how to narrow them
///
/// This is the contract between the query builders and a
/// [`DocumentStore`]; stores evaluate it however their backend requires.
///
/// # REST Reference
/// - `StructuredQuery` (`from`, `where`, `orderBy`, `limit`)
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    /// Document path the collection lives under, empty for root collections
    pub parent_path: String,
    /// Last segment of the collection path, or the collection-group id
    pub collection_id: String,
    /// Match every collection named `collection_id` below `parent_path`
    pub all_descendants: bool,
    /// Conjunction of predicates, in the order they were applied
    pub filters: Vec<Filter>,
    /// Orderings, in the order they were applied
    pub orders: Vec<OrderBy>,
    /// Maximum number of documents
    pub limit: Option<u32>,
}

impl QueryState {
    /// State selecting one collection by its full path (`"users/a/posts"`)
    pub fn collection(collection_path: &str) -> Self {
        let collection_path = collection_path.trim_matches('/');
        let (parent_path, collection_id) = match collection_path.rsplit_once('/') {
            Some((parent, id)) => (parent.to_string(), id.to_string()),
            None => (String::new(), collection_path.to_string()),
        };
        Self {
            parent_path,
            collection_id,
            all_descendants: false,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
        }
    }

    /// State selecting every collection with the given id
    pub fn collection_group(collection_id: &str) -> Self {
        Self {
            parent_path: String::new(),
            collection_id: collection_id.to_string(),
            all_descendants: true,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
        }
    }

    /// Full collection path for single-collection queries
    pub fn collection_path(&self) -> String {
        if self.parent_path.is_empty() {
            self.collection_id.clone()
        } else {
            format!("{}/{}", self.parent_path, self.collection_id)
        }
    }
}

/// Base query trait for building and executing queries
///
/// Query methods consume `self` and return a new instance carrying the
/// extended state.
pub trait Query: Clone + Sized {
    /// Store backing the client this query runs against
    type Store: DocumentStore;

    /// Get the internal query state
    #[doc(hidden)]
    fn query_state(&self) -> &QueryState;

    /// Create a new instance with modified state
    #[doc(hidden)]
    fn with_state(&self, state: QueryState) -> Self;

    /// Client the query executes on
    fn firestore(&self) -> &Firestore<Self::Store>;

    /// Add a validated filter
    fn where_filter(self, filter: Filter) -> Self {
        let mut state = self.query_state().clone();
        state.filters.push(filter);
        self.with_state(state)
    }

    /// Add a filter from its parts
    fn where_field(self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.where_filter(Filter::with_operator(field, operator, value))
    }

    /// Order query results by field
    fn order_by(self, field: impl Into<String>, direction: Direction) -> Self {
        let mut order = OrderBy::new(field);
        if direction == Direction::Descending {
            order.desc();
        }
        let mut state = self.query_state().clone();
        state.orders.push(order);
        self.with_state(state)
    }

    /// Limit query results to first n documents
    fn limit(self, limit: u32) -> Self {
        let mut state = self.query_state().clone();
        state.limit = Some(limit);
        self.with_state(state)
    }

    /// Apply search parameters: filters in order, then ordering, then limit
    ///
    /// Absent parts are no-ops. A limit of zero is treated as absent.
    fn search(self, filter_query: FilterQuery, order_by: Option<OrderBy>, limit: Option<u32>) -> Self {
        let mut state = self.query_state().clone();
        state.filters.extend(filter_query.into_filters());
        if let Some(order) = order_by {
            state.orders.push(order);
        }
        if let Some(limit) = limit.filter(|n| *n > 0) {
            state.limit = Some(limit);
        }
        self.with_state(state)
    }

    /// Lazy stream of matching documents
    ///
    /// Nothing is sent to the store until the stream is first polled.
    fn stream(&self) -> DocumentStream {
        let state = self.query_state().clone();
        tracing::debug!(
            collection = %state.collection_id,
            all_descendants = state.all_descendants,
            filters = state.filters.len(),
            limit = ?state.limit,
            "running query"
        );
        self.firestore().store().run_query(state)
    }

    /// Execute the query and collect every document
    fn get(&self) -> impl std::future::Future<Output = Result<Vec<DocumentSnapshot>, FirebaseError>> + Send {
        let stream = self.stream();
        async move { stream.try_collect().await }
    }
}
