//! Statement logging for any [`GenericClient`].

use crate::client::GenericClient;
use crate::error::JoblyResult;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Default truncation for logged statements (in bytes).
pub const DEFAULT_MAX_SQL_LENGTH: usize = 200;

/// A [`GenericClient`] wrapper that emits every statement under the
/// `jobly.sql` target at debug level before running it.
///
/// ```ignore
/// let client = pool.get().await?;
/// let conn = TracingClient::new(&*client).max_sql_length(120);
/// let companies = Company::find_all(&conn, &CompanyFilter::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TracingClient<C> {
    inner: C,
    max_sql_length: Option<usize>,
}

impl<C: GenericClient> TracingClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            max_sql_length: Some(DEFAULT_MAX_SQL_LENGTH),
        }
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn emit(&self, tag: Option<&str>, sql: &str, param_count: usize) {
        let sql = truncate_sql(sql, self.max_sql_length);
        tracing::debug!(
            target: "jobly.sql",
            tag = tag.unwrap_or("-"),
            param_count,
            sql = %sql,
        );
    }
}

impl<C: GenericClient> GenericClient for TracingClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
        self.emit(None, sql, params.len());
        self.inner.query(sql, params).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<Vec<Row>> {
        self.emit(Some(tag), sql, params.len());
        self.inner.query_tagged(tag, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<u64> {
        self.emit(None, sql, params.len());
        self.inner.execute(sql, params).await
    }

    async fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> JoblyResult<u64> {
        self.emit(Some(tag), sql, params.len());
        self.inner.execute_tagged(tag, sql, params).await
    }
}

/// Cut `sql` to at most `max` bytes on a char boundary, marking the cut with `...`.
pub(crate) fn truncate_sql(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end])
        }
        _ => sql.to_string(),
    }
}
