//! Dynamic query construction for partial updates and filtered lists.
//!
//! Column names always come from code; only values travel as `$n` parameters.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// A typed query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    /// Nullable text. `None` binds SQL NULL.
    OptText(Option<String>),
    Float(Option<f64>),
    Int(Option<i32>),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
    TextArray(Vec<String>),
}

/// Bind every parameter in order.
pub fn bind_params<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: &'q [QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        q = match param {
            QueryParam::Text(s) => q.bind(s),
            QueryParam::OptText(s) => q.bind(s),
            QueryParam::Float(f) => q.bind(f),
            QueryParam::Int(i) => q.bind(i),
            QueryParam::Bool(b) => q.bind(b),
            QueryParam::Timestamp(ts) => q.bind(ts),
            QueryParam::TextArray(arr) => q.bind(arr),
        };
    }
    q
}

/// Builds `UPDATE <table> SET ... WHERE id = $n` from the fields present in a
/// partial update.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<String>,
    params: Vec<QueryParam>,
    touch_updated_at: bool,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            params: Vec::new(),
            touch_updated_at: true,
        }
    }

    /// For tables without an `updated_at` column.
    pub fn without_timestamp(mut self) -> Self {
        self.touch_updated_at = false;
        self
    }

    pub fn set(&mut self, column: &'static str, param: QueryParam) -> &mut Self {
        self.params.push(param);
        self.assignments
            .push(format!("{} = ${}", column, self.params.len()));
        self
    }

    /// Set `column` only when a value is present.
    pub fn set_opt<T>(
        &mut self,
        column: &'static str,
        value: Option<T>,
        to_param: impl FnOnce(T) -> QueryParam,
    ) -> &mut Self {
        if let Some(value) = value {
            self.set(column, to_param(value));
        }
        self
    }

    /// True when no column has been assigned.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Finish the statement for one row.
    ///
    /// `extra_predicate` is ANDed onto the id match, e.g. the active-row
    /// predicate. `returning` lists columns for a `RETURNING` clause.
    pub fn build_for_id(
        mut self,
        id: &str,
        extra_predicate: Option<&str>,
        returning: Option<&str>,
    ) -> (String, Vec<QueryParam>) {
        let mut assignments = std::mem::take(&mut self.assignments);
        if self.touch_updated_at {
            assignments.push("updated_at = now()".to_string());
        }
        self.params.push(QueryParam::Text(id.to_string()));

        let mut sql = format!(
            "UPDATE {} SET {} WHERE id = ${}",
            self.table,
            assignments.join(", "),
            self.params.len()
        );
        if let Some(predicate) = extra_predicate {
            sql.push_str(" AND ");
            sql.push_str(predicate);
        }
        if let Some(columns) = returning {
            sql.push_str(" RETURNING ");
            sql.push_str(columns);
        }
        (sql, self.params)
    }
}

/// Accumulates `WHERE` conditions with positional parameters.
#[derive(Debug, Default)]
pub struct WhereBuilder {
    conditions: Vec<String>,
    params: Vec<QueryParam>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixed condition with no parameters.
    pub fn push(&mut self, condition: &str) -> &mut Self {
        self.conditions.push(condition.to_string());
        self
    }

    /// Add a condition with one parameter. `{}` in `template` is replaced by
    /// the placeholder.
    pub fn push_param(&mut self, template: &str, param: QueryParam) -> &mut Self {
        self.params.push(param);
        let placeholder = format!("${}", self.params.len());
        self.conditions.push(template.replace("{}", &placeholder));
        self
    }

    /// `WHERE a AND b`, or an empty string without conditions.
    pub fn clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    pub fn into_params(self) -> Vec<QueryParam> {
        self.params
    }
}
