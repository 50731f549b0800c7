//! Parameterized filter, sort, and pagination building.
//!
//! Every filter value travels as a bound parameter; column names never come
//! from callers, only from the per-entity allowlists the repositories pass
//! in. Ordering always carries an `id` tiebreak so paginated reads are
//! deterministic under concurrent inserts.

use crate::error::{StoreError, StoreResult};
use sqlx::Sqlite;
use sqlx::sqlite::SqliteArguments;

/// Default page size when the caller does not specify one.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Upper bound on page size.
pub const MAX_PAGE_LIMIT: i64 = 500;

/// A value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Bound as a chrono value so it encodes exactly like stored timestamps.
    Timestamp(chrono::DateTime<chrono::Utc>),
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for QueryParam {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Self::Timestamp(v)
    }
}

/// Bind a parameter to a typed `query_as` query.
pub(crate) fn bind_param_as<'q, T>(
    query: sqlx::query::QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    param: &'q QueryParam,
) -> sqlx::query::QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::Text(v) => query.bind(v.as_str()),
        QueryParam::Timestamp(v) => query.bind(*v),
    }
}

/// Comparison operator for a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ge,
    Le,
    Like,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Like => "LIKE",
        }
    }
}

/// A conjunction of column predicates.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    predicates: Vec<(&'static str, Op, QueryParam)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<QueryParam>) -> Self {
        self.predicates.push((column, Op::Eq, value.into()));
        self
    }

    pub fn ge(mut self, column: &'static str, value: impl Into<QueryParam>) -> Self {
        self.predicates.push((column, Op::Ge, value.into()));
        self
    }

    pub fn le(mut self, column: &'static str, value: impl Into<QueryParam>) -> Self {
        self.predicates.push((column, Op::Le, value.into()));
        self
    }

    pub fn like(mut self, column: &'static str, pattern: impl Into<QueryParam>) -> Self {
        self.predicates.push((column, Op::Like, pattern.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Offset/limit pagination with clamped bounds.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset: offset.max(0),
        }
    }

    /// First page with the default limit.
    pub fn first() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first()
    }
}

/// Explicit sort key; `id` is always appended as a tiebreak.
#[derive(Debug, Clone, Copy)]
pub struct Sort {
    pub key: &'static str,
    pub descending: bool,
}

impl Sort {
    pub fn asc(key: &'static str) -> Self {
        Self {
            key,
            descending: false,
        }
    }

    pub fn desc(key: &'static str) -> Self {
        Self {
            key,
            descending: true,
        }
    }
}

/// Build a `SELECT *` statement over `table` with bound parameters.
///
/// Predicate and sort columns must appear in `allowed`; anything else is a
/// programming error surfaced as a validation failure rather than SQL.
pub(crate) fn build_select(
    table: &'static str,
    allowed: &'static [&'static str],
    filter: &Filter,
    sort: &Sort,
    page: &Page,
) -> StoreResult<(String, Vec<QueryParam>)> {
    let mut sql = format!("SELECT * FROM {}", table);
    let mut params = Vec::with_capacity(filter.predicates.len() + 2);

    for (i, (column, op, value)) in filter.predicates.iter().enumerate() {
        check_column(table, allowed, *column)?;
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(column);
        sql.push(' ');
        sql.push_str(op.sql());
        sql.push_str(" ?");
        params.push(value.clone());
    }

    check_column(table, allowed, sort.key)?;
    let direction = if sort.descending { " DESC" } else { "" };
    sql.push_str(&format!(
        " ORDER BY {}{}, id{} LIMIT ? OFFSET ?",
        sort.key, direction, direction
    ));
    params.push(QueryParam::Int(page.limit));
    params.push(QueryParam::Int(page.offset));

    Ok((sql, params))
}

fn check_column(
    table: &'static str,
    allowed: &'static [&'static str],
    column: &'static str,
) -> StoreResult<()> {
    if allowed.contains(&column) {
        Ok(())
    } else {
        Err(StoreError::validation(
            table,
            "filter",
            format!("column '{}' is not filterable", column),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: &[&str] = &["id", "name", "code", "created_at"];

    #[test]
    fn test_build_select_no_filter() {
        let (sql, params) =
            build_select("nations", COLS, &Filter::new(), &Sort::asc("name"), &Page::first())
                .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM nations ORDER BY name, id LIMIT ? OFFSET ?"
        );
        assert_eq!(params, vec![QueryParam::Int(50), QueryParam::Int(0)]);
    }

    #[test]
    fn test_build_select_with_predicates() {
        let filter = Filter::new().eq("code", "ITA").like("name", "Ital%");
        let (sql, params) = build_select(
            "nations",
            COLS,
            &filter,
            &Sort::desc("created_at"),
            &Page::new(10, 20),
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM nations WHERE code = ? AND name LIKE ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            params,
            vec![
                QueryParam::Text("ITA".to_string()),
                QueryParam::Text("Ital%".to_string()),
                QueryParam::Int(10),
                QueryParam::Int(20),
            ]
        );
    }

    #[test]
    fn test_build_select_rejects_unknown_filter_column() {
        let filter = Filter::new().eq("password", "x");
        let result = build_select("nations", COLS, &filter, &Sort::asc("name"), &Page::first());
        assert!(matches!(result, Err(StoreError::Validation { .. })));
    }

    #[test]
    fn test_build_select_rejects_unknown_sort_column() {
        let result = build_select(
            "nations",
            COLS,
            &Filter::new(),
            &Sort::asc("sneaky"),
            &Page::first(),
        );
        assert!(matches!(result, Err(StoreError::Validation { .. })));
    }

    #[test]
    fn test_page_clamps_limit_and_offset() {
        let page = Page::new(0, -5);
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset, 0);

        let page = Page::new(10_000, 3);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
        assert_eq!(page.offset, 3);
    }

    #[test]
    fn test_range_predicates() {
        let filter = Filter::new()
            .ge("created_at", "2026-01-01T00:00:00Z")
            .le("created_at", "2026-12-31T23:59:59Z");
        let (sql, _) =
            build_select("nations", COLS, &filter, &Sort::asc("created_at"), &Page::first())
                .unwrap();
        assert!(sql.contains("created_at >= ?"));
        assert!(sql.contains("created_at <= ?"));
    }
}
