//! Builders for the `filter`, `order`, `expand`, `limit`, `offset` and
//! `search` query parameters.

use std::fmt;

use chrono::NaiveDateTime;

use crate::datetime::format_timestamp;

/// A value on the right-hand side of a filter condition.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    List(Vec<FilterValue>),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(number) => write!(f, "{number}"),
            Self::Float(number) => write!(f, "{number}"),
            Self::Bool(flag) => f.write_str(if *flag { "true" } else { "false" }),
            Self::Timestamp(timestamp) => f.write_str(&format_timestamp(timestamp)),
            Self::List(items) => {
                let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Condition {
    field: String,
    operator: String,
    value: FilterValue,
}

/// Ordered set of `field{op}value` conditions joined with `;`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Adds a condition with an arbitrary operator.
    #[must_use]
    pub fn add(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "=", value)
    }

    #[must_use]
    pub fn neq(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "!=", value)
    }

    #[must_use]
    pub fn gt(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, ">", value)
    }

    #[must_use]
    pub fn lt(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "<", value)
    }

    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, ">=", value)
    }

    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "<=", value)
    }

    /// Substring match.
    #[must_use]
    pub fn like(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "~", value)
    }

    /// Prefix match.
    #[must_use]
    pub fn starts_with(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "~=", value)
    }

    /// Renders the `filter` parameter value, or `None` when empty.
    pub fn render(&self) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| {
                format!("{}{}{}", condition.field, condition.operator, condition.value)
            })
            .collect();
        Some(parts.join(";"))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sort keys rendered as `field,asc;field2,desc`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderBy {
    fields: Vec<(String, Direction)>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.fields.push((field.into(), direction));
        self
    }

    #[must_use]
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.by(field, Direction::Asc)
    }

    #[must_use]
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.by(field, Direction::Desc)
    }

    pub fn render(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, direction)| format!("{field},{}", direction.as_str()))
            .collect();
        Some(parts.join(";"))
    }
}

/// Fluent builder for list request parameters.
///
/// ```
/// use moysklad_client::{Direction, QueryBuilder};
///
/// let params = QueryBuilder::new()
///     .eq("archived", false)
///     .like("name", "tea")
///     .order_by("name", Direction::Asc)
///     .expand("images")
///     .limit(100)
///     .to_params();
///
/// assert_eq!(params[0], ("filter".to_owned(), "archived=false;name~tea".to_owned()));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuilder {
    filter: Filter,
    order: OrderBy,
    expand: Vec<String>,
    limit: Option<u32>,
    offset: Option<u32>,
    search: Option<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn add(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.filter = self.filter.add(field, operator, value);
        self
    }

    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "=", value)
    }

    #[must_use]
    pub fn neq(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "!=", value)
    }

    #[must_use]
    pub fn gt(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, ">", value)
    }

    #[must_use]
    pub fn lt(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "<", value)
    }

    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, ">=", value)
    }

    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "<=", value)
    }

    #[must_use]
    pub fn like(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "~", value)
    }

    #[must_use]
    pub fn starts_with(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.add(field, "~=", value)
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = self.order.by(field, direction);
        self
    }

    /// Adds nested fields to expand; repeated calls accumulate.
    #[must_use]
    pub fn expand(mut self, fields: impl Into<String>) -> Self {
        let fields = fields.into();
        self.expand.extend(
            fields
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_owned),
        );
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Full-text search across the entity's searchable fields.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Query pairs in the order `filter`, `order`, `expand`, `limit`,
    /// `offset`, `search`. Unset parts are omitted.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(filter) = self.filter.render() {
            params.push(("filter".to_owned(), filter));
        }
        if let Some(order) = self.order.render() {
            params.push(("order".to_owned(), order));
        }
        if !self.expand.is_empty() {
            params.push(("expand".to_owned(), self.expand.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_owned(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_owned(), offset.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search".to_owned(), search.clone()));
        }
        params
    }
}

pub(crate) fn params_of(query: Option<&QueryBuilder>) -> Vec<(String, String)> {
    query.map(QueryBuilder::to_params).unwrap_or_default()
}
