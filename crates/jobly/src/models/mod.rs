//! Company and job repositories.
//!
//! Every operation takes a `&impl GenericClient`, so callers choose whether
//! it runs on a pooled connection or inside their own transaction.

pub mod company;
pub mod job;

pub use company::{Company, CompanyDetail, CompanyFilter, CompanyPatch, JobSummary, NewCompany};
pub use job::{Job, JobFilter, JobListing, JobPatch, NewJob};
