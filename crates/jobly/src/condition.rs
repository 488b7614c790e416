//! Predicate terms for optional-filter queries.
//!
//! A [`Condition`] is one term of a conjunctive `WHERE` clause. Most terms
//! compare a column against a bound value; [`Condition::positive`] is the
//! exception and renders a constant comparison that binds nothing.

use crate::error::JoblyResult;
use crate::ident::Ident;
use crate::sql::Sql;
use crate::value::Value;

/// Query operator for a bound comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Greater than or equal: column >= value
    Gte,
    /// Less than or equal: column <= value
    Lte,
    /// Case-insensitive LIKE (PostgreSQL ILIKE)
    Ilike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Ilike => "ILIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ConditionInner {
    /// `column <op> $n`
    Bound { column: Ident, op: Op, value: Value },
    /// `column <op> <literal>`; consumes no placeholder.
    Constant {
        column: Ident,
        operator: &'static str,
        literal: &'static str,
    },
}

/// A single predicate term used by [`Filter`](crate::filter::Filter).
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(ConditionInner);

impl Condition {
    /// Create a bound comparison over a validated column identifier.
    pub fn new(column: &str, op: Op, value: impl Into<Value>) -> JoblyResult<Self> {
        Ok(Condition(ConditionInner::Bound {
            column: Ident::parse(column)?,
            op,
            value: value.into(),
        }))
    }

    /// column >= value
    pub fn gte(column: &str, value: impl Into<Value>) -> JoblyResult<Self> {
        Self::new(column, Op::Gte, value)
    }

    /// column <= value
    pub fn lte(column: &str, value: impl Into<Value>) -> JoblyResult<Self> {
        Self::new(column, Op::Lte, value)
    }

    /// column ILIKE pattern
    pub fn ilike(column: &str, pattern: impl Into<Value>) -> JoblyResult<Self> {
        Self::new(column, Op::Ilike, pattern)
    }

    /// column > 0, with no bound value.
    pub fn positive(column: &str) -> JoblyResult<Self> {
        Ok(Condition(ConditionInner::Constant {
            column: Ident::parse(column)?,
            operator: ">",
            literal: "0",
        }))
    }

    /// Whether rendering this term consumes a placeholder.
    pub fn binds_value(&self) -> bool {
        matches!(self.0, ConditionInner::Bound { .. })
    }

    /// Append this condition into a [`Sql`] builder.
    ///
    /// Placeholders are numbered by `Sql`, so terms that bind nothing never
    /// shift the numbering of the terms after them.
    pub fn append_to_sql(&self, sql: &mut Sql) {
        match &self.0 {
            ConditionInner::Bound { column, op, value } => {
                sql.push_ident_ref(column);
                sql.push(" ");
                sql.push(op.as_sql());
                sql.push(" ");
                sql.push_bind(value.clone());
            }
            ConditionInner::Constant {
                column,
                operator,
                literal,
            } => {
                sql.push_ident_ref(column);
                sql.push(" ");
                sql.push(operator);
                sql.push(" ");
                sql.push(literal);
            }
        }
    }
}
