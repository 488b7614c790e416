use crate::changeset::{ValidationErrors, double_option};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{Filter, FilterSpec, build_filter_clause};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::update::{ColumnAlias, FieldMap, build_update_fragment};
use crate::validate::{Validate, check_fraction, check_min, check_not_empty};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// A job with the name of the company offering it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub company_name: Option<String>,
}

impl FromRow for JobListing {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            job: Job::from_row(row)?,
            company_name: row.try_get_column("company_name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    #[serde(alias = "company_handle")]
    pub company_handle: String,
}

impl Validate for NewJob {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_not_empty(&mut errors, "title", &self.title);
        if let Some(salary) = self.salary {
            check_min(&mut errors, "salary", salary, 0);
        }
        if let Some(equity) = self.equity {
            check_fraction(&mut errors, "equity", equity);
        }
        check_not_empty(&mut errors, "companyHandle", &self.company_handle);
        errors.into_result()
    }
}

/// Fields a job update may change. A job never moves between companies.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equity: Option<Option<Decimal>>,
}

impl JobPatch {
    pub fn to_field_map(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields
            .insert_opt("title", self.title.as_deref())
            .insert_opt("salary", self.salary)
            .insert_opt("equity", self.equity);
        fields
    }
}

impl Validate for JobPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(title) = &self.title {
            check_not_empty(&mut errors, "title", title);
        }
        if let Some(Some(salary)) = self.salary {
            check_min(&mut errors, "salary", salary, 0);
        }
        if let Some(Some(equity)) = self.equity {
            check_fraction(&mut errors, "equity", equity);
        }
        errors.into_result()
    }
}

/// Optional predicates for [`Job::find_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
    pub title: Option<String>,
}

impl FilterSpec for JobFilter {
    fn apply(&self, filter: &mut Filter) -> JoblyResult<()> {
        filter.gte("salary", self.min_salary)?;
        filter.positive("equity", self.has_equity)?;
        filter.contains("title", self.title.as_deref())?;
        Ok(())
    }
}

impl Job {
    /// Insert a job, refusing a second posting with the same title at the
    /// same company.
    pub async fn create(conn: &impl GenericClient, input: &NewJob) -> JoblyResult<Job> {
        let existing = query("SELECT id FROM jobs WHERE title = $1 AND company_handle = $2")
            .bind(&input.title)
            .bind(&input.company_handle)
            .tag("job.duplicate_check")
            .fetch_opt(conn)
            .await?;
        if existing.is_some() {
            return Err(JoblyError::duplicate(format!(
                "Duplicate job posting: {}, {}",
                input.title, input.company_handle
            )));
        }

        let job: Job = query(format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) RETURNING {JOB_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(input.salary)
        .bind(input.equity)
        .bind(&input.company_handle)
        .tag("job.create")
        .fetch_one_as(conn)
        .await?;

        tracing::info!(id = job.id, company = %job.company_handle, "job created");
        Ok(job)
    }

    /// All jobs matching `filter`, ordered by title.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: &JobFilter,
    ) -> JoblyResult<Vec<JobListing>> {
        let clause = build_filter_clause(filter)?;

        let mut sql = String::from(
            "SELECT jobs.id, jobs.title, jobs.salary, jobs.equity, jobs.company_handle, \
                    companies.name AS company_name \
             FROM jobs \
             LEFT JOIN companies ON companies.handle = jobs.company_handle",
        );
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause.clause);
        }
        sql.push_str(" ORDER BY jobs.title, jobs.id");

        let jobs: Vec<JobListing> = query(sql)
            .bind_fragment(clause)
            .tag("job.find_all")
            .fetch_all_as(conn)
            .await?;
        tracing::debug!(count = jobs.len(), "jobs listed");
        Ok(jobs)
    }

    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<Job> {
        query(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .tag("job.get")
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))
    }

    /// Apply a partial update and return the stored result.
    pub async fn update(conn: &impl GenericClient, id: i32, patch: &JobPatch) -> JoblyResult<Job> {
        let set = build_update_fragment(&patch.to_field_map(), &ColumnAlias::IDENTITY)?;
        let key = set.next_placeholder();

        let updated: Option<Job> = query(format!(
            "UPDATE jobs SET {} WHERE id = ${key} RETURNING {JOB_COLUMNS}",
            set.clause
        ))
        .bind_fragment(set)
        .bind(id)
        .tag("job.update")
        .fetch_opt_as(conn)
        .await?;

        let job = updated.ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))?;
        tracing::info!(id = job.id, "job updated");
        Ok(job)
    }

    /// Delete a job, returning its id.
    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<i32> {
        let row = query("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .tag("job.remove")
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))?;

        let removed: i32 = row.try_get_column("id")?;
        tracing::info!(id = removed, "job removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::str::FromStr;

    fn filter(min_salary: Option<i32>, has_equity: Option<bool>, title: Option<&str>) -> JobFilter {
        JobFilter {
            min_salary,
            has_equity,
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn min_salary_alone() {
        let fragment = build_filter_clause(&filter(Some(20000), None, None)).unwrap();
        assert_eq!(fragment.clause, "salary >= $1");
        assert_eq!(fragment.values, vec![Value::Int(20000)]);
    }

    #[test]
    fn equity_flag_binds_no_value() {
        let fragment = build_filter_clause(&filter(Some(100), Some(true), None)).unwrap();
        assert_eq!(fragment.clause, "salary >= $1 AND equity > 0");
        assert_eq!(fragment.values, vec![Value::Int(100)]);
    }

    #[test]
    fn title_after_equity_takes_next_placeholder() {
        let fragment = build_filter_clause(&filter(Some(100), Some(true), Some("eng"))).unwrap();
        assert_eq!(fragment.clause, "salary >= $1 AND equity > 0 AND title ILIKE $2");
        assert_eq!(fragment.values, vec![Value::Int(100), Value::from("%eng%")]);
    }

    #[test]
    fn false_equity_flag_is_ignored() {
        let fragment = build_filter_clause(&filter(None, Some(false), None)).unwrap();
        assert!(fragment.is_empty());
        assert!(fragment.values.is_empty());
    }

    #[test]
    fn new_job_accepts_either_handle_spelling() {
        let camel: NewJob =
            serde_json::from_str(r#"{"title": "J", "salary": 1, "equity": 0.5, "companyHandle": "c1"}"#)
                .unwrap();
        let snake: NewJob =
            serde_json::from_str(r#"{"title": "J", "salary": 1, "equity": 0.5, "company_handle": "c1"}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.equity, Some(Decimal::from_str("0.5").unwrap()));
    }

    #[test]
    fn new_job_validation() {
        let input = NewJob {
            title: String::new(),
            salary: Some(-5),
            equity: Some(Decimal::from_str("1.5").unwrap()),
            company_handle: "c1".into(),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("salary"));
        assert!(errors.has("equity"));
        assert!(!errors.has("companyHandle"));
    }

    #[test]
    fn patch_cannot_move_a_job() {
        assert!(serde_json::from_str::<JobPatch>(r#"{"companyHandle": "c2"}"#).is_err());
        assert!(serde_json::from_str::<JobPatch>(r#"{"id": 9}"#).is_err());
    }

    #[test]
    fn patch_uses_identity_columns() {
        let patch: JobPatch = serde_json::from_str(r#"{"title": "New", "salary": null}"#).unwrap();
        let fragment = build_update_fragment(&patch.to_field_map(), &ColumnAlias::IDENTITY).unwrap();
        assert_eq!(fragment.clause, r#""title" = $1, "salary" = $2"#);
        assert_eq!(fragment.values, vec![Value::from("New"), Value::Null]);
    }

    #[test]
    fn listing_serializes_flat() {
        let listing = JobListing {
            job: Job {
                id: 7,
                title: "J1".into(),
                salary: Some(100),
                equity: None,
                company_handle: "c1".into(),
            },
            company_name: Some("C1".into()),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["companyHandle"], "c1");
        assert_eq!(json["companyName"], "C1");
    }
}
