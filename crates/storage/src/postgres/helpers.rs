//! Shared helpers for building keyset window queries.

use chrono::{DateTime, Utc};
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;

use folio_core::pagination::{PageDirection, PageRequest};

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

/// Dynamically built `WHERE` clause.
///
/// SAFETY: This dynamic SQL is safe from injection because:
/// 1. Column names and operators are hardcoded by the repositories
/// 2. Every VALUE is parameterized via $1, $2, etc. and bound separately
/// 3. Order direction comes from an enum, never from user strings
#[derive(Debug, Default)]
pub struct WhereClause {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition. Every `?` in `template` is replaced by the
    /// placeholder of `param`.
    pub fn push(&mut self, template: &str, param: SqlParam) -> &mut Self {
        self.params.push(param);
        let placeholder = format!("${}", self.params.len());
        self.conditions.push(template.replace('?', &placeholder));
        self
    }

    /// Add the keyset bound of `page` on `column`, if it has a cursor.
    pub fn keyset(&mut self, column: &str, page: &PageRequest) -> &mut Self {
        if let Some(cursor) = page.cursor() {
            let template = format!("{} {} ?", column, cursor_op(page.direction()));
            self.push(&template, SqlParam::Time(cursor.timestamp()));
        }
        self
    }

    /// Render the clause, or an empty string when there are no conditions.
    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    #[cfg(test)]
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// Bind every parameter to `query`, in placeholder order.
    pub fn bind<'q, O>(
        self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for param in self.params {
            query = match param {
                SqlParam::Int(v) => query.bind(v),
                SqlParam::Text(v) => query.bind(v),
                SqlParam::Time(v) => query.bind(v),
            };
        }
        query
    }
}

/// Comparison that keeps rows on the far side of the cursor.
pub fn cursor_op(direction: PageDirection) -> &'static str {
    match direction {
        PageDirection::Next => ">",
        PageDirection::Prev => "<",
    }
}

/// Scan order: ascending going forward, closest-to-cursor first going back.
pub fn order_sql(direction: PageDirection) -> &'static str {
    match direction {
        PageDirection::Next => "ASC",
        PageDirection::Prev => "DESC",
    }
}

/// Raw id values for `= ANY($1)` binds.
pub fn raw_ids<T: Copy>(ids: &[T], get: impl Fn(T) -> i64) -> Vec<i64> {
    ids.iter().copied().map(get).collect()
}
