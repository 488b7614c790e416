//! # jobly
//!
//! PostgreSQL data access for a job-board API: companies and the jobs they
//! post.
//!
//! - **Partial updates**: [`build_update_fragment`] turns the fields a client
//!   sent into a `SET` body with aligned `$n` placeholders
//! - **Optional filters**: [`build_filter_clause`] composes only the
//!   predicates that are present
//! - **Bound values only**: request data is never spliced into SQL text;
//!   column names come from fixed tables and are validated before use
//! - **Transaction-friendly**: repositories take any [`GenericClient`]
//!
//! ```ignore
//! use jobly::{Company, CompanyFilter};
//!
//! let filter = CompanyFilter { min_employees: Some(10), ..Default::default() };
//! let companies = Company::find_all(&client, &filter).await?;
//! ```

pub mod changeset;
pub mod client;
pub mod condition;
pub mod error;
pub mod filter;
pub mod ident;
pub mod models;
pub mod query;
pub mod row;
pub mod sql;
pub mod trace;
pub mod update;
pub mod validate;
pub mod value;

pub use changeset::{FieldError, ValidationCode, ValidationErrors};
pub use client::GenericClient;
pub use condition::{Condition, Op};
pub use error::{JoblyError, JoblyResult};
pub use filter::{Filter, FilterSpec, build_filter_clause};
pub use ident::Ident;
pub use models::{
    Company, CompanyDetail, CompanyFilter, CompanyPatch, Job, JobFilter, JobListing, JobPatch,
    JobSummary, NewCompany, NewJob,
};
pub use query::query;
pub use row::{FromRow, RowExt};
pub use sql::{Sql, SqlFragment};
pub use trace::TracingClient;
pub use update::{ColumnAlias, FieldMap, build_update_fragment};
pub use validate::{Validate, ensure_valid};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "pool")]
pub use deadpool_postgres;
pub use tokio_postgres;
