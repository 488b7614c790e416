use crate::changeset::{ValidationErrors, double_option};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{Filter, FilterSpec, build_filter_clause};
use crate::query::query;
use crate::row::{FromRow, RowExt};
use crate::update::{ColumnAlias, FieldMap, build_update_fragment};
use crate::validate::{Validate, check_handle, check_min, check_not_empty, check_url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Columns returned for every company read.
const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// Request field names that differ from their column.
pub const COMPANY_ALIASES: ColumnAlias =
    ColumnAlias::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

/// A job as listed under its company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

/// A company together with its jobs, ordered by title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<JobSummary>,
}

impl CompanyDetail {
    /// Fold the rows of a `companies LEFT JOIN jobs` query.
    ///
    /// Returns `None` for an empty row set. A company without jobs yields a
    /// single row whose job columns are all null.
    fn from_joined_rows(rows: &[Row]) -> JoblyResult<Option<Self>> {
        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let company = Company::from_row(first)?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(id) = row.try_get_column::<Option<i32>>("job_id")? else {
                continue;
            };
            jobs.push(JobSummary {
                id,
                title: row.try_get_column("title")?,
                salary: row.try_get_column("salary")?,
                equity: row.try_get_column("equity")?,
            });
        }
        Ok(Some(Self { company, jobs }))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Validate for NewCompany {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_handle(&mut errors, "handle", &self.handle);
        check_not_empty(&mut errors, "name", &self.name);
        if let Some(n) = self.num_employees {
            check_min(&mut errors, "numEmployees", n, 0);
        }
        if let Some(url) = &self.logo_url {
            check_url(&mut errors, "logoUrl", url);
        }
        errors.into_result()
    }
}

/// Fields a company update may change. The handle is immutable.
///
/// `numEmployees` and `logoUrl` distinguish an absent key (unchanged) from
/// an explicit `null` (cleared).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyPatch {
    /// The requested changes keyed by request field name.
    pub fn to_field_map(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields
            .insert_opt("name", self.name.as_deref())
            .insert_opt("description", self.description.as_deref())
            .insert_opt("numEmployees", self.num_employees)
            .insert_opt("logoUrl", self.logo_url.as_ref().map(|u| u.as_deref()));
        fields
    }
}

impl Validate for CompanyPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(name) = &self.name {
            check_not_empty(&mut errors, "name", name);
        }
        if let Some(Some(n)) = self.num_employees {
            check_min(&mut errors, "numEmployees", n, 0);
        }
        if let Some(Some(url)) = &self.logo_url {
            check_url(&mut errors, "logoUrl", url);
        }
        errors.into_result()
    }
}

/// Optional predicates for [`Company::find_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
    pub name: Option<String>,
}

impl FilterSpec for CompanyFilter {
    fn apply(&self, filter: &mut Filter) -> JoblyResult<()> {
        filter.range("num_employees", self.min_employees, self.max_employees)?;
        filter.contains("name", self.name.as_deref())?;
        Ok(())
    }
}

impl Company {
    /// Insert a company, refusing a handle that is already taken.
    pub async fn create(conn: &impl GenericClient, input: &NewCompany) -> JoblyResult<Company> {
        let existing = query("SELECT handle FROM companies WHERE handle = $1")
            .bind(&input.handle)
            .tag("company.duplicate_check")
            .fetch_opt(conn)
            .await?;
        if existing.is_some() {
            return Err(JoblyError::duplicate(format!(
                "Duplicate company: {}",
                input.handle
            )));
        }

        let company: Company = query(format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(&input.handle)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.num_employees)
        .bind(input.logo_url.as_deref())
        .tag("company.create")
        .fetch_one_as(conn)
        .await?;

        tracing::info!(handle = %company.handle, "company created");
        Ok(company)
    }

    /// All companies matching `filter`, ordered by name.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: &CompanyFilter,
    ) -> JoblyResult<Vec<Company>> {
        let clause = build_filter_clause(filter)?;

        let mut sql = format!("SELECT {COMPANY_COLUMNS} FROM companies");
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause.clause);
        }
        sql.push_str(" ORDER BY name");

        let companies: Vec<Company> = query(sql)
            .bind_fragment(clause)
            .tag("company.find_all")
            .fetch_all_as(conn)
            .await?;
        tracing::debug!(count = companies.len(), "companies listed");
        Ok(companies)
    }

    /// One company with its jobs.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let rows = query(
            "SELECT c.handle, c.name, c.description, c.num_employees, c.logo_url, \
                    j.id AS job_id, j.title, j.salary, j.equity \
             FROM companies c \
             LEFT JOIN jobs j ON j.company_handle = c.handle \
             WHERE c.handle = $1 \
             ORDER BY j.title, j.id",
        )
        .bind(handle)
        .tag("company.get")
        .fetch_all(conn)
        .await?;

        CompanyDetail::from_joined_rows(&rows)?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))
    }

    /// Apply a partial update and return the stored result.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        patch: &CompanyPatch,
    ) -> JoblyResult<Company> {
        let set = build_update_fragment(&patch.to_field_map(), &COMPANY_ALIASES)?;
        let key = set.next_placeholder();

        let updated: Option<Company> = query(format!(
            "UPDATE companies SET {} WHERE handle = ${key} RETURNING {COMPANY_COLUMNS}",
            set.clause
        ))
        .bind_fragment(set)
        .bind(handle)
        .tag("company.update")
        .fetch_opt_as(conn)
        .await?;

        let company = updated.ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;
        tracing::info!(handle = %company.handle, "company updated");
        Ok(company)
    }

    /// Delete a company, returning its handle.
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<String> {
        let row = query("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .bind(handle)
            .tag("company.remove")
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;

        let removed: String = row.try_get_column("handle")?;
        tracing::info!(handle = %removed, "company removed");
        Ok(removed)
    }
}
