//! Filter and ordering value objects
//!
//! A [`Filter`] is an immutable `(field, operator, value)` triple whose
//! operator has been checked against the allowlist when it was built.
//! Filters carry no evaluation logic; queries read their named fields when
//! they are compiled.

use crate::error::FirebaseError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted by a [`Filter`]
///
/// # REST Reference
/// - `StructuredQuery.FieldFilter.Operator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `==`
    Equal,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `!=`
    NotEqual,
    /// `array-contains`
    ArrayContains,
    /// `array-contains-any`
    ArrayContainsAny,
    /// `in`
    In,
    /// `not-in`
    NotIn,
}

impl Operator {
    /// Every accepted operator, in allowlist order
    pub const ALL: [Operator; 10] = [
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Equal,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::NotEqual,
        Operator::ArrayContains,
        Operator::ArrayContainsAny,
        Operator::In,
        Operator::NotIn,
    ];

    /// Query-language spelling (`"<"`, `"array-contains"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Equal => "==",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::NotEqual => "!=",
            Operator::ArrayContains => "array-contains",
            Operator::ArrayContainsAny => "array-contains-any",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }

    /// Short mnemonic alias accepted when parsing (`"lt"`, `"eq"`, ...)
    fn mnemonic(&self) -> &'static str {
        match self {
            Operator::LessThan => "lt",
            Operator::LessThanOrEqual => "lte",
            Operator::Equal => "eq",
            Operator::GreaterThan => "gt",
            Operator::GreaterThanOrEqual => "gte",
            Operator::NotEqual => "neq",
            other => other.as_str(),
        }
    }

    /// Operator name in the Firestore REST API
    pub fn rest_name(&self) -> &'static str {
        match self {
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Operator::Equal => "EQUAL",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            Operator::NotEqual => "NOT_EQUAL",
            Operator::ArrayContains => "ARRAY_CONTAINS",
            Operator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
        }
    }

    /// Whether the store treats this operator as a range/inequality predicate
    pub fn is_inequality(&self) -> bool {
        matches!(
            self,
            Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::NotEqual
                | Operator::NotIn
        )
    }

    /// Accepted spellings, used in [`FirebaseError::InvalidOperator`]
    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(Operator::as_str).collect()
    }
}

impl FromStr for Operator {
    type Err = FirebaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s || op.mnemonic() == s)
            .ok_or_else(|| FirebaseError::InvalidOperator {
                op: s.to_string(),
                allowed: Self::allowed(),
            })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `(field, operator, value)` predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    operator: Operator,
    value: Value,
}

impl Filter {
    /// Build a filter from an operator spelling
    ///
    /// Fails with [`FirebaseError::InvalidOperator`] if `op` is not one of
    /// [`Operator::allowed`] (or its mnemonic alias such as `"gte"`).
    ///
    /// # Example
    /// ```
    /// use firestore_facade::firestore::{Filter, Operator};
    /// use serde_json::json;
    ///
    /// let filter = Filter::new("age", ">=", json!(18)).unwrap();
    /// assert_eq!(filter.operator(), Operator::GreaterThanOrEqual);
    /// assert!(Filter::new("age", "~", json!(18)).is_err());
    /// ```
    pub fn new(field: impl Into<String>, op: &str, value: impl Into<Value>) -> Result<Self, FirebaseError> {
        let operator = op.parse::<Operator>()?;
        Ok(Self::with_operator(field, operator, value))
    }

    /// Build a filter from an already typed operator
    pub fn with_operator(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::with_operator(field, Operator::Equal, value)
    }

    /// `field != value`
    pub fn not_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::with_operator(field, Operator::NotEqual, value)
    }

    /// `field in [values]`
    pub fn value_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::with_operator(field, Operator::In, Value::Array(values))
    }

    /// `field not-in [values]`
    pub fn value_not_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::with_operator(field, Operator::NotIn, Value::Array(values))
    }

    /// Array field contains `value`
    pub fn array_contains(array_field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::with_operator(array_field, Operator::ArrayContains, value)
    }

    /// Array field contains any of `values`
    pub fn array_contains_any(array_field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::with_operator(array_field, Operator::ArrayContainsAny, Value::Array(values))
    }

    /// Field path the predicate applies to
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Comparison operator
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Comparison value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Decompose into `(field, operator, value)`
    pub fn into_parts(self) -> (String, Operator, Value) {
        (self.field, self.operator, self.value)
    }
}

/// Filters for a search: absent, a single filter, or a conjunction
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FilterQuery {
    /// No filtering
    #[default]
    None,
    /// One predicate
    Single(Filter),
    /// All predicates must match, applied in list order
    All(Vec<Filter>),
}

impl FilterQuery {
    /// Flatten into the ordered list of predicates to apply
    pub fn into_filters(self) -> Vec<Filter> {
        match self {
            FilterQuery::None => Vec::new(),
            FilterQuery::Single(filter) => vec![filter],
            FilterQuery::All(filters) => filters,
        }
    }
}

impl From<Filter> for FilterQuery {
    fn from(filter: Filter) -> Self {
        FilterQuery::Single(filter)
    }
}

impl From<Vec<Filter>> for FilterQuery {
    fn from(filters: Vec<Filter>) -> Self {
        FilterQuery::All(filters)
    }
}

impl From<Option<Filter>> for FilterQuery {
    fn from(filter: Option<Filter>) -> Self {
        filter.map_or(FilterQuery::None, FilterQuery::Single)
    }
}

/// Sort direction for query ordering
///
/// # REST Reference
/// - `StructuredQuery.Direction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl Direction {
    /// Direction name in the Firestore REST API
    pub fn rest_name(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }
}

/// Ordering applied to a search, ascending unless switched with [`OrderBy::desc`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    field_path: String,
    direction: Direction,
}

impl OrderBy {
    /// Ascending order on `field_path`
    pub fn new(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            direction: Direction::Ascending,
        }
    }

    /// Descending order on `field_path`
    pub fn descending(field_path: impl Into<String>) -> Self {
        let mut order = Self::new(field_path);
        order.desc();
        order
    }

    /// Switch to ascending order
    pub fn asc(&mut self) {
        self.direction = Direction::Ascending;
    }

    /// Switch to descending order
    pub fn desc(&mut self) {
        self.direction = Direction::Descending;
    }

    /// Field the results are ordered by
    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    /// Current direction
    pub fn direction(&self) -> Direction {
        self.direction
    }
}
