//! Clause fragments with bind-order placeholder numbering.
//!
//! [`Sql`] interleaves literal text and bound values and numbers the
//! placeholders only when it renders, so a clause assembled from several
//! optional pieces never has gaps or repeats in its `$n` sequence.
//!
//! ```ignore
//! use jobly::sql::Sql;
//!
//! let mut q = Sql::empty();
//! q.push_ident("salary")?.push(" >= ").push_bind(20000);
//! let fragment = q.build()?;
//! assert_eq!(fragment.clause, "salary >= $1");
//! ```

use crate::error::{JoblyError, JoblyResult};
use crate::ident::Ident;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// One piece of a fragment: literal text, or a value whose placeholder is
/// numbered at render time.
#[derive(Debug)]
enum Piece {
    Text(String),
    Bind(Value),
}

/// A parameter-safe SQL fragment under construction.
#[must_use]
#[derive(Debug, Default)]
pub struct Sql {
    pieces: Vec<Piece>,
}

impl Sql {
    /// Start from literal text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            pieces: vec![Piece::Text(text.into())],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces
            .iter()
            .all(|piece| matches!(piece, Piece::Text(text) if text.is_empty()))
    }

    /// Values bound so far.
    pub fn param_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|piece| matches!(piece, Piece::Bind(_)))
            .count()
    }

    /// Literal text. Never pass client input here.
    pub fn push(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.write_text(|tail| tail.push_str(text));
        }
        self
    }

    /// A placeholder bound to `value`.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.pieces.push(Piece::Bind(value.into()));
        self
    }

    /// Splice `other` in place; its placeholders are renumbered on render.
    pub fn push_sql(&mut self, other: Sql) -> &mut Self {
        self.pieces.extend(other.pieces);
        self
    }

    /// A column name as written (`salary`, `jobs.title`), after validation.
    pub fn push_ident(&mut self, column: &str) -> JoblyResult<&mut Self> {
        let ident = Ident::parse(column)?;
        Ok(self.push_ident_ref(&ident))
    }

    /// A column name with each segment double-quoted, after validation.
    pub fn push_quoted_ident(&mut self, column: &str) -> JoblyResult<&mut Self> {
        let ident = Ident::parse(column)?;
        self.write_text(|tail| ident.write_quoted_sql(tail));
        Ok(self)
    }

    pub fn push_ident_ref(&mut self, ident: &Ident) -> &mut Self {
        self.write_text(|tail| ident.write_sql(tail));
        self
    }

    /// Extend the trailing text piece, opening one after a bind.
    fn write_text(&mut self, write: impl FnOnce(&mut String)) {
        match self.pieces.last_mut() {
            Some(Piece::Text(tail)) => write(tail),
            _ => {
                let mut tail = String::new();
                write(&mut tail);
                self.pieces.push(Piece::Text(tail));
            }
        }
    }

    /// The clause text with `$1, $2, ...` in bind order.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut n = 0usize;
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Bind(_) => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                }
            }
        }
        out
    }

    /// Render into a [`SqlFragment`].
    ///
    /// Fails if literal text smuggled in something that looks like a
    /// placeholder, since `$k` would then no longer name `values[k - 1]`.
    pub fn build(self) -> JoblyResult<SqlFragment> {
        let clause = self.to_sql();
        let values: Vec<Value> = self
            .pieces
            .into_iter()
            .filter_map(|piece| match piece {
                Piece::Bind(value) => Some(value),
                Piece::Text(_) => None,
            })
            .collect();

        let fragment = SqlFragment { clause, values };
        let placeholders = fragment.placeholder_count();
        if placeholders != fragment.values.len() {
            return Err(JoblyError::validation(format!(
                "fragment has {placeholders} placeholders for {} values",
                fragment.values.len()
            )));
        }
        Ok(fragment)
    }
}

/// A rendered clause plus the values for its placeholders.
///
/// `$k` in `clause` binds to `values[k - 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub clause: String,
    pub values: Vec<Value>,
}

impl SqlFragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// `$n` occurrences in the clause text.
    pub fn placeholder_count(&self) -> usize {
        let bytes = self.clause.as_bytes();
        bytes
            .windows(2)
            .filter(|w| w[0] == b'$' && w[1].is_ascii_digit())
            .count()
    }

    /// The `$n` a statement should use for its first value after this fragment.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// Borrowed values in the shape the driver expects.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}
