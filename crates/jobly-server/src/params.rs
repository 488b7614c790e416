//! Query-string parameters for the list endpoints.
//!
//! Query strings arrive as text. They deserialize into string-typed structs
//! that reject unknown keys, then convert into typed filters through
//! `TryFrom`, which rejects anything that does not parse.

use jobly::{CompanyFilter, JobFilter, JoblyError, JoblyResult};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyQuery {
    pub min_employees: Option<String>,
    pub max_employees: Option<String>,
    pub name: Option<String>,
}

impl TryFrom<CompanyQuery> for CompanyFilter {
    type Error = JoblyError;

    fn try_from(q: CompanyQuery) -> JoblyResult<Self> {
        let min_employees = parse_int("minEmployees", q.min_employees.as_deref())?;
        let max_employees = parse_int("maxEmployees", q.max_employees.as_deref())?;
        if let (Some(min), Some(max)) = (min_employees, max_employees) {
            if min > max {
                return Err(JoblyError::validation(
                    "minEmployees must not exceed maxEmployees",
                ));
            }
        }

        Ok(CompanyFilter {
            min_employees,
            max_employees,
            name: non_empty(q.name),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobQuery {
    pub min_salary: Option<String>,
    pub has_equity: Option<String>,
    pub title: Option<String>,
}

impl TryFrom<JobQuery> for JobFilter {
    type Error = JoblyError;

    fn try_from(q: JobQuery) -> JoblyResult<Self> {
        Ok(JobFilter {
            min_salary: parse_int("minSalary", q.min_salary.as_deref())?,
            has_equity: parse_flag("hasEquity", q.has_equity.as_deref())?,
            title: non_empty(q.title),
        })
    }
}

fn parse_int(param: &str, raw: Option<&str>) -> JoblyResult<Option<i32>> {
    raw.map(|s| {
        s.trim()
            .parse::<i32>()
            .map_err(|_| JoblyError::validation(format!("{param} must be an integer, got {s:?}")))
    })
    .transpose()
}

fn parse_flag(param: &str, raw: Option<&str>) -> JoblyResult<Option<bool>> {
    match raw {
        None => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(JoblyError::validation(format!(
            "{param} must be true or false, got {other:?}"
        ))),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(min: Option<&str>, max: Option<&str>, name: Option<&str>) -> CompanyQuery {
        CompanyQuery {
            min_employees: min.map(Into::into),
            max_employees: max.map(Into::into),
            name: name.map(Into::into),
        }
    }

    fn job(min_salary: Option<&str>, has_equity: Option<&str>) -> JobQuery {
        JobQuery {
            min_salary: min_salary.map(Into::into),
            has_equity: has_equity.map(Into::into),
            title: None,
        }
    }

    #[test]
    fn company_query_converts() {
        let filter = CompanyFilter::try_from(company(Some("10"), Some(" 20 "), Some("net"))).unwrap();
        assert_eq!(
            filter,
            CompanyFilter {
                min_employees: Some(10),
                max_employees: Some(20),
                name: Some("net".into()),
            }
        );
    }

    #[test]
    fn empty_query_is_no_filter() {
        assert_eq!(
            CompanyFilter::try_from(CompanyQuery::default()).unwrap(),
            CompanyFilter::default()
        );
        assert_eq!(JobFilter::try_from(JobQuery::default()).unwrap(), JobFilter::default());
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        let err = CompanyFilter::try_from(company(Some("ten"), None, None)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("minEmployees"));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = CompanyFilter::try_from(company(Some("10"), Some("5"), None)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn blank_name_is_ignored() {
        let filter = CompanyFilter::try_from(company(None, None, Some(""))).unwrap();
        assert_eq!(filter.name, None);
    }

    #[test]
    fn equity_flag_parses_strictly() {
        assert_eq!(JobFilter::try_from(job(None, Some("true"))).unwrap().has_equity, Some(true));
        assert_eq!(JobFilter::try_from(job(None, Some("false"))).unwrap().has_equity, Some(false));
        assert!(JobFilter::try_from(job(None, Some("yes"))).is_err());
        assert!(JobFilter::try_from(job(None, Some("1"))).is_err());
    }

    #[test]
    fn salary_must_be_an_integer() {
        assert_eq!(JobFilter::try_from(job(Some("20000"), None)).unwrap().min_salary, Some(20000));
        assert!(JobFilter::try_from(job(Some("2.5"), None)).is_err());
    }

    #[test]
    fn unknown_parameters_are_rejected() {
        let raw = r#"{"minSalary": "1", "equity": "true"}"#;
        assert!(serde_json::from_str::<JobQuery>(raw).is_err());
    }
}
