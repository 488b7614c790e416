//! Column-name validation.
//!
//! Column names are the one part of a generated statement that cannot be
//! bound as a parameter, so every column that reaches a fragment goes through
//! [`Ident`] first. Each dot-separated segment must match
//! `[A-Za-z_][A-Za-z0-9_$]*`; anything else, quotes included, is refused.

use crate::error::{JoblyError, JoblyResult};
use std::fmt;

/// A validated, optionally table-qualified column name (`salary`, `jobs.title`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    segments: Vec<String>,
}

impl Ident {
    pub fn parse(s: &str) -> JoblyResult<Self> {
        if s.is_empty() {
            return Err(JoblyError::validation("column name cannot be empty"));
        }

        let segments = s
            .split('.')
            .map(|segment| check_segment(s, segment).map(str::to_string))
            .collect::<JoblyResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// `jobs.title`
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    /// `"jobs"."title"`
    pub fn to_quoted_sql(&self) -> String {
        let mut out = String::new();
        self.write_quoted_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        out.push_str(&self.segments.join("."));
    }

    pub(crate) fn write_quoted_sql(&self, out: &mut String) {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            // Segments never contain `"`, so no escaping is needed.
            out.push('"');
            out.push_str(segment);
            out.push('"');
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn check_segment<'a>(whole: &str, segment: &'a str) -> JoblyResult<&'a str> {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return Err(JoblyError::validation(format!(
            "empty segment in column name {whole:?}"
        )));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(JoblyError::validation(format!(
            "column name {whole:?} must start with a letter or '_'"
        )));
    }
    if let Some(bad) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(JoblyError::validation(format!(
            "invalid character {bad:?} in column name {whole:?}"
        )));
    }
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_column() {
        let ident = Ident::parse("num_employees").unwrap();
        assert_eq!(ident.to_sql(), "num_employees");
        assert_eq!(ident.to_quoted_sql(), r#""num_employees""#);
    }

    #[test]
    fn qualified_column() {
        let ident = Ident::parse("jobs.title").unwrap();
        assert_eq!(ident.segments().collect::<Vec<_>>(), vec!["jobs", "title"]);
        assert_eq!(ident.to_string(), "jobs.title");
        assert_eq!(ident.to_quoted_sql(), r#""jobs"."title""#);
    }

    #[test]
    fn rejects_injection_shapes() {
        for bad in [
            "",
            "1col",
            "name; DROP TABLE companies; --",
            "name = name OR 1",
            "a..b",
            "a.",
            ".a",
            r#""quoted""#,
            "logo-url",
        ] {
            assert!(Ident::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
