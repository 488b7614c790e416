//! Running statements whose placeholders are already numbered.

use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::row::FromRow;
use crate::sql::SqlFragment;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A complete statement plus the owned values for `$1..$n`.
///
/// Repositories splice rendered fragments into the text, then bind the
/// fragment's values followed by any trailing keys:
///
/// ```ignore
/// let set = build_update_fragment(&fields, &COMPANY_ALIASES)?;
/// let key = set.next_placeholder();
/// query(format!("UPDATE companies SET {} WHERE handle = ${key} RETURNING ...", set.clause))
///     .bind_fragment(set)
///     .bind(handle)
///     .tag("company.update")
///     .fetch_opt_as::<Company>(&conn)
///     .await?;
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct Query {
    sql: String,
    params: Vec<Value>,
    tag: Option<String>,
}

pub fn query(sql: impl Into<String>) -> Query {
    Query {
        sql: sql.into(),
        params: Vec::new(),
        tag: None,
    }
}

impl Query {
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Append a fragment's values in placeholder order.
    pub fn bind_fragment(mut self, fragment: SqlFragment) -> Self {
        self.params.extend(fragment.values);
        self
    }

    /// Short label passed to logging clients, e.g. `job.find_all`.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn bound(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }

    pub async fn fetch_all(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        let params = self.bound();
        if let Some(tag) = &self.tag {
            conn.query_tagged(tag, &self.sql, &params).await
        } else {
            conn.query(&self.sql, &params).await
        }
    }

    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Vec<T>> {
        self.fetch_all(conn).await?.iter().map(T::from_row).collect()
    }

    /// The first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> JoblyResult<Option<Row>> {
        let params = self.bound();
        if let Some(tag) = &self.tag {
            conn.query_opt_tagged(tag, &self.sql, &params).await
        } else {
            conn.query_opt(&self.sql, &params).await
        }
    }

    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Option<T>> {
        match self.fetch_opt(conn).await? {
            Some(row) => T::from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    /// The first row; [`JoblyError::NotFound`] when the result is empty.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> JoblyResult<Row> {
        match self.fetch_opt(conn).await? {
            Some(row) => Ok(row),
            None => Err(JoblyError::not_found("query returned no rows")),
        }
    }

    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        T::from_row(&self.fetch_one(conn).await?)
    }

    /// Rows affected.
    pub async fn execute(&self, conn: &impl GenericClient) -> JoblyResult<u64> {
        let params = self.bound();
        if let Some(tag) = &self.tag {
            conn.execute_tagged(tag, &self.sql, &params).await
        } else {
            conn.execute(&self.sql, &params).await
        }
    }
}
