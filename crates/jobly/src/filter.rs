//! Conjunctive optional-filter composition.
//!
//! Each entity describes its filter as a [`FilterSpec`]: a record of
//! independently optional predicates. [`build_filter_clause`] turns it into a
//! `WHERE` body (without the keyword) plus aligned bound values, or an empty
//! fragment when no predicate is present.
//!
//! ```ignore
//! let fragment = build_filter_clause(&JobFilter {
//!     min_salary: Some(100),
//!     has_equity: Some(true),
//!     title: None,
//! })?;
//! assert_eq!(fragment.clause, "salary >= $1 AND equity > 0");
//! assert_eq!(fragment.values, vec![Value::Int(100)]);
//! ```

use crate::condition::Condition;
use crate::error::{JoblyError, JoblyResult};
use crate::sql::{Sql, SqlFragment};
use crate::value::Value;

/// A set of optional predicates that can be rendered as a filter.
pub trait FilterSpec {
    /// Push the present predicates onto `filter`, in a fixed order.
    fn apply(&self, filter: &mut Filter) -> JoblyResult<()>;
}

/// Build the conjunctive `WHERE` body for `predicates`.
///
/// Returns an empty fragment when no predicate is set; callers omit
/// the `WHERE` keyword in that case.
pub fn build_filter_clause(predicates: &impl FilterSpec) -> JoblyResult<SqlFragment> {
    let mut filter = Filter::new();
    predicates.apply(&mut filter)?;
    filter.build()
}

/// Accumulates predicate terms in the order they are added.
#[derive(Debug, Default)]
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

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Add an arbitrary term.
    pub fn push(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    /// `column >= min` when `min` is present.
    pub fn gte<T: Into<Value>>(&mut self, column: &str, min: Option<T>) -> JoblyResult<&mut Self> {
        if let Some(min) = min {
            self.conditions.push(Condition::gte(column, min)?);
        }
        Ok(self)
    }

    /// `column <= max` when `max` is present.
    pub fn lte<T: Into<Value>>(&mut self, column: &str, max: Option<T>) -> JoblyResult<&mut Self> {
        if let Some(max) = max {
            self.conditions.push(Condition::lte(column, max)?);
        }
        Ok(self)
    }

    /// Lower and upper bounds on one column.
    ///
    /// An inverted range (`min > max`) can never match and is rejected
    /// before anything is rendered.
    pub fn range<T>(&mut self, column: &str, min: Option<T>, max: Option<T>) -> JoblyResult<&mut Self>
    where
        T: Into<Value> + PartialOrd + std::fmt::Display + Copy,
    {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(JoblyError::validation(format!(
                    "minimum {column} ({lo}) must not exceed maximum ({hi})"
                )));
            }
        }
        self.gte(column, min)?;
        self.lte(column, max)
    }

    /// `column > 0` when `flag` is `Some(true)`; otherwise no term at all.
    pub fn positive(&mut self, column: &str, flag: Option<bool>) -> JoblyResult<&mut Self> {
        if flag == Some(true) {
            self.conditions.push(Condition::positive(column)?);
        }
        Ok(self)
    }

    /// Case-insensitive substring match when `text` is present.
    ///
    /// The text is matched literally: `%`, `_` and `\` are escaped before it
    /// is wrapped in `%...%`.
    pub fn contains(&mut self, column: &str, text: Option<&str>) -> JoblyResult<&mut Self> {
        if let Some(text) = text {
            let pattern = format!("%{}%", escape_like(text));
            self.conditions.push(Condition::ilike(column, pattern)?);
        }
        Ok(self)
    }

    /// Join all terms with `AND`.
    pub fn build(&self) -> JoblyResult<SqlFragment> {
        let mut sql = Sql::empty();
        for (i, cond) in self.conditions.iter().enumerate() {
            if i > 0 {
                sql.push(" AND ");
            }
            cond.append_to_sql(&mut sql);
        }
        sql.build()
    }
}

/// Escape LIKE/ILIKE wildcards so `text` matches literally.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
