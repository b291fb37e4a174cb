//! Query builder for the hosted REST backend
//!
//! A [`QueryBuilder`] encodes to PostgREST query parameters for the HTTP client
//! and can also evaluate itself against JSON rows for the in-process client.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{AppointmentStatus, Role, VerificationStatus};

/// Query builder for constructing backend queries
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    /// Columns to return, all columns when empty
    pub columns: Vec<String>,
    /// List of filters to apply
    pub filters: Vec<Filter>,
    /// Groups where at least one filter must hold
    pub any_of: Vec<Vec<Filter>>,
    /// Columns to order results by, applied left to right
    pub order_by: Vec<(String, Direction)>,
    /// Maximum number of results to return
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

/// A filter condition for backend queries
#[derive(Debug, Clone)]
pub struct Filter {
    /// Column name to filter on
    pub field: String,
    /// Comparison operator
    pub operator: Operator,
    /// Value to compare against
    pub value: FilterType,
}

/// Comparison operators for filters
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operator {
    /// Equality (eq)
    Equal,
    /// Inequality (neq)
    NotEqual,
    /// Greater than (gt)
    GreaterThan,
    /// Greater than or equal (gte)
    GreaterThanOrEqual,
    /// Less than (lt)
    LessThan,
    /// Less than or equal (lte)
    LessThanOrEqual,
    /// Pattern matching (like)
    Like,
    /// Case-insensitive pattern matching (ilike)
    ILike,
    /// Set membership (in)
    In,
    /// Null check (is)
    Is,
}

impl Operator {
    /// PostgREST operator keyword
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "neq",
            Self::GreaterThan => "gt",
            Self::GreaterThanOrEqual => "gte",
            Self::LessThan => "lt",
            Self::LessThanOrEqual => "lte",
            Self::Like => "like",
            Self::ILike => "ilike",
            Self::In => "in",
            Self::Is => "is",
        }
    }
}

/// Sort direction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first, nulls last
    Ascending,
    /// Largest first, nulls first
    Descending,
}

/// Value types for filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum FilterType {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Boolean value
    Boolean(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Instant, sent as RFC 3339 in UTC
    Timestamp(DateTime<Utc>),
    /// NULL value
    Null,
    /// Array of text values
    TextArray(Vec<String>),
}

impl FilterType {
    fn encode(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Time(t) => t.format("%H:%M:%S").to_string(),
            Self::Timestamp(at) => at.to_rfc3339(),
            Self::Null => "null".to_string(),
            Self::TextArray(items) => {
                let quoted: Vec<String> = items.iter().map(|item| quote_list_item(item)).collect();
                format!("({})", quoted.join(","))
            },
        }
    }
}

fn quote_list_item(item: &str) -> String {
    if item.contains([',', '(', ')', '"']) {
        format!("\"{}\"", item.replace('"', "\\\""))
    } else {
        item.to_string()
    }
}

impl From<&str> for FilterType {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterType {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for FilterType {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDate> for FilterType {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveTime> for FilterType {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<DateTime<Utc>> for FilterType {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<bool> for FilterType {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FilterType {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Role> for FilterType {
    fn from(value: Role) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<AppointmentStatus> for FilterType {
    fn from(value: AppointmentStatus) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<VerificationStatus> for FilterType {
    fn from(value: VerificationStatus) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl QueryBuilder {
    /// Create a new empty query builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter condition to the query
    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Append an ordering column
    pub fn add_order(&mut self, column: &str, direction: Direction) {
        self.order_by.push((column.to_string(), direction));
    }

    /// Set the maximum number of results to return
    pub const fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    /// Set the number of results to skip
    pub const fn set_offset(&mut self, offset: usize) {
        self.offset = Some(offset);
    }

    /// Restrict the returned columns
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Require at least one of the filters added by `build`
    #[must_use]
    pub fn any_of(mut self, build: impl FnOnce(Self) -> Self) -> Self {
        let group = build(Self::new()).filters;
        if !group.is_empty() {
            self.any_of.push(group);
        }
        self
    }

    fn with_filter(mut self, field: &str, operator: Operator, value: FilterType) -> Self {
        self.add_filter(Filter { field: field.to_string(), operator, value });
        self
    }

    #[must_use]
    pub fn eq(self, field: &str, value: impl Into<FilterType>) -> Self {
        self.with_filter(field, Operator::Equal, value.into())
    }

    #[must_use]
    pub fn neq(self, field: &str, value: impl Into<FilterType>) -> Self {
        self.with_filter(field, Operator::NotEqual, value.into())
    }

    #[must_use]
    pub fn gt(self, field: &str, value: impl Into<FilterType>) -> Self {
        self.with_filter(field, Operator::GreaterThan, value.into())
    }

    #[must_use]
    pub fn gte(self, field: &str, value: impl Into<FilterType>) -> Self {
        self.with_filter(field, Operator::GreaterThanOrEqual, value.into())
    }

    #[must_use]
    pub fn lt(self, field: &str, value: impl Into<FilterType>) -> Self {
        self.with_filter(field, Operator::LessThan, value.into())
    }

    #[must_use]
    pub fn lte(self, field: &str, value: impl Into<FilterType>) -> Self {
        self.with_filter(field, Operator::LessThanOrEqual, value.into())
    }

    /// Pattern match where `*` or `%` stands for any run of characters
    #[must_use]
    pub fn like(self, field: &str, pattern: &str) -> Self {
        self.with_filter(field, Operator::Like, FilterType::Text(pattern.to_string()))
    }

    /// Case-insensitive [`like`](Self::like)
    #[must_use]
    pub fn ilike(self, field: &str, pattern: &str) -> Self {
        self.with_filter(field, Operator::ILike, FilterType::Text(pattern.to_string()))
    }

    #[must_use]
    pub fn in_list<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let items = values.into_iter().map(|v| v.to_string()).collect();
        self.with_filter(field, Operator::In, FilterType::TextArray(items))
    }

    #[must_use]
    pub fn is_null(self, field: &str) -> Self {
        self.with_filter(field, Operator::Is, FilterType::Null)
    }

    #[must_use]
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.add_order(column, direction);
        self
    }

    #[must_use]
    pub fn order_asc(self, column: &str) -> Self {
        self.order(column, Direction::Ascending)
    }

    #[must_use]
    pub fn order_desc(self, column: &str) -> Self {
        self.order(column, Direction::Descending)
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Encode as PostgREST query parameters
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        let select = if self.columns.is_empty() { "*".to_string() } else { self.columns.join(",") };
        params.push(("select".to_string(), select));

        for filter in &self.filters {
            params.push((filter.field.clone(), filter.encode_condition()));
        }

        for group in &self.any_of {
            let conditions: Vec<String> =
                group.iter().map(|f| format!("{}.{}", f.field, f.encode_condition())).collect();
            params.push(("or".to_string(), format!("({})", conditions.join(","))));
        }

        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| match direction {
                    Direction::Ascending => format!("{column}.asc"),
                    Direction::Descending => format!("{column}.desc"),
                })
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }

        params
    }

    /// True when `row` satisfies every filter
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(row))
            && self.any_of.iter().all(|group| group.iter().any(|filter| filter.matches(row)))
    }

    /// Filter, order, page and project `rows` the way the backend would
    #[must_use]
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
        let mut selected: Vec<&Value> = rows.into_iter().filter(|row| self.matches(row)).collect();

        if !self.order_by.is_empty() {
            selected.sort_by(|a, b| self.compare_rows(a, b));
        }

        selected
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|row| self.project(row))
            .collect()
    }

    fn compare_rows(&self, a: &Value, b: &Value) -> Ordering {
        for (column, direction) in &self.order_by {
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            // nulls sort last ascending and first descending
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_values(left, right),
            };
            let ordering = match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn project(&self, row: &Value) -> Value {
        if self.columns.is_empty() || self.columns.iter().any(|c| c == "*") {
            return row.clone();
        }
        let Value::Object(map) = row else {
            return row.clone();
        };
        let projected = self
            .columns
            .iter()
            .filter_map(|column| map.get(column).map(|value| (column.clone(), value.clone())))
            .collect();
        Value::Object(projected)
    }
}

impl Filter {
    /// `operator.value` as sent to the backend
    fn encode_condition(&self) -> String {
        let value = match (self.operator, &self.value) {
            (Operator::Like | Operator::ILike, FilterType::Text(pattern)) => pattern.replace('%', "*"),
            (_, value) => value.encode(),
        };
        format!("{}.{}", self.operator.keyword(), value)
    }

    /// Evaluate this filter against a JSON row
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        let cell = row.get(&self.field).unwrap_or(&Value::Null);

        match self.operator {
            Operator::Is => match &self.value {
                FilterType::Null => cell.is_null(),
                FilterType::Boolean(expected) => cell.as_bool() == Some(*expected),
                _ => false,
            },
            Operator::In => match &self.value {
                FilterType::TextArray(items) => cell_text(cell).is_some_and(|text| items.contains(&text)),
                _ => false,
            },
            Operator::Like | Operator::ILike => {
                let (Some(text), FilterType::Text(pattern)) = (cell_text(cell), &self.value) else {
                    return false;
                };
                if self.operator == Operator::ILike {
                    glob_match(&pattern.to_lowercase(), &text.to_lowercase())
                } else {
                    glob_match(pattern, &text)
                }
            },
            _ => {
                if cell.is_null() {
                    return false;
                }
                let ordering = compare_cell(cell, &self.value);
                match self.operator {
                    Operator::Equal => ordering == Some(Ordering::Equal),
                    Operator::NotEqual => ordering.is_some_and(|o| o != Ordering::Equal),
                    Operator::GreaterThan => ordering == Some(Ordering::Greater),
                    Operator::GreaterThanOrEqual => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                    Operator::LessThan => ordering == Some(Ordering::Less),
                    Operator::LessThanOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                    _ => false,
                }
            },
        }
    }
}

fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare_cell(cell: &Value, value: &FilterType) -> Option<Ordering> {
    match value {
        FilterType::Integer(n) => cell.as_f64().and_then(|c| c.partial_cmp(&(*n as f64))),
        FilterType::Boolean(b) => cell.as_bool().map(|c| c.cmp(b)),
        FilterType::Null | FilterType::TextArray(_) => None,
        other => cell_text(cell).map(|text| text.as_str().cmp(other.encode().as_str())),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => cell_text(a).cmp(&cell_text(b)),
    }
}

/// Match `text` against a pattern where `*` and `%` match any run of characters
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '*' || pattern[p] == '%') {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*' || *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*smith*", "john smithers"));
        assert!(glob_match("%ann", "joann"));
        assert!(!glob_match("ann*", "joann"));
        assert!(glob_match("*", ""));
    }

    #[test]
    fn test_null_handling() {
        let row = json!({"reason": null, "status": "pending"});
        assert!(QueryBuilder::new().is_null("reason").matches(&row));
        assert!(QueryBuilder::new().is_null("missing").matches(&row));
        assert!(!QueryBuilder::new().eq("reason", "x").matches(&row));
        assert!(!QueryBuilder::new().neq("reason", "x").matches(&row));
    }

    #[test]
    fn test_list_items_with_commas_are_quoted() {
        let params = QueryBuilder::new().in_list("full_name", ["Doe, Jane", "Roe"]).to_params();
        assert_eq!(params[1], ("full_name".to_string(), "in.(\"Doe, Jane\",Roe)".to_string()));
    }
}
