//! Partial-update `SET` fragments.
//!
//! A [`FieldMap`] holds only the fields a client asked to change. The
//! builder maps each application field name to its column through a
//! [`ColumnAlias`] table and emits `"column" = $n` assignments whose
//! placeholders line up with the returned values.

use crate::error::{JoblyError, JoblyResult};
use crate::sql::{Sql, SqlFragment};
use crate::value::Value;

/// Insertion-ordered map from application field name to a new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`. An existing key keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    /// Consuming counterpart of [`FieldMap::insert`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert only when `value` is present (`None` => field untouched).
    pub fn insert_opt<T: Into<Value>>(&mut self, field: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.insert(field, v);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Static mapping from application field names to column names.
///
/// Fields missing from the table use their own name as the column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAlias {
    pairs: &'static [(&'static str, &'static str)],
}

impl ColumnAlias {
    /// Every field maps to a column of the same name.
    pub const IDENTITY: ColumnAlias = ColumnAlias::new(&[]);

    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { pairs }
    }

    /// Column for `field`, falling back to `field` itself.
    pub fn resolve<'a>(&self, field: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|(app, _)| *app == field)
            .map_or(field, |(_, column)| *column)
    }
}

/// Build the `SET` body of an `UPDATE` from the fields to change.
///
/// Fails with a validation error when `fields` is empty: `SET` with no
/// assignments is not valid SQL. Column names are validated and quoted;
/// values are only ever bound.
pub fn build_update_fragment(fields: &FieldMap, aliases: &ColumnAlias) -> JoblyResult<SqlFragment> {
    if fields.is_empty() {
        return Err(JoblyError::validation("No data"));
    }

    let mut set = Sql::empty();
    for (i, (field, value)) in fields.iter().enumerate() {
        if i > 0 {
            set.push(", ");
        }
        set.push_quoted_ident(aliases.resolve(field))?
            .push(" = ")
            .push_bind(value.clone());
    }
    set.build()
}
