//! Connection pool setup

use crate::error::{JoblyError, JoblyResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Pool size used by [`create_pool`].
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Create a connection pool from a database URL.
///
/// ```ignore
/// let pool = jobly::create_pool("postgres://localhost/jobly")?;
/// let client = pool.get().await?;
/// ```
pub fn create_pool(database_url: &str) -> JoblyResult<Pool> {
    create_pool_with_config(database_url, DEFAULT_POOL_SIZE)
}

/// Create a pool holding at most `max_size` connections.
///
/// Connections are opened lazily, so an unreachable server only surfaces on
/// the first `pool.get()`. A malformed URL fails here.
pub fn create_pool_with_config(database_url: &str, max_size: usize) -> JoblyResult<Pool> {
    if max_size == 0 {
        return Err(JoblyError::Connection(
            "pool size must be at least 1".to_string(),
        ));
    }

    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| JoblyError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| JoblyError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_url_is_a_connection_error() {
        let err = create_pool("postgres://localhost:notaport/db").unwrap_err();
        assert!(matches!(err, JoblyError::Connection(_)));
    }

    #[test]
    fn zero_sized_pool_is_rejected() {
        let err = create_pool_with_config("postgres://localhost/jobly", 0).unwrap_err();
        assert!(matches!(err, JoblyError::Connection(_)));
    }
}
