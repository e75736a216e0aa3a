// handlers/protected/records/mod.rs - incident, ticket and dataset tables
//
// Any session may read; writes go through require_writer.
use serde::Deserialize;
use std::str::FromStr;

use crate::error::ApiError;

pub mod datasets;
pub mod incidents;
pub mod tickets;

/// Query string shared by the list endpoints. Only the filters that make
/// sense for a table are honoured by its handler.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub severity: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub uploaded_by: Option<String>,
    pub min_rows: Option<i64>,
    pub before: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// `?limit=` for the top-N endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Parse an optional query value into one of the text enums, naming the
/// parameter in the 400 on failure.
pub fn parse_filter<T>(name: &str, value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ApiError::bad_request(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Severity, Status};

    #[test]
    fn filters_parse_or_reject() {
        assert_eq!(parse_filter::<Severity>("severity", None).unwrap(), None);
        assert_eq!(parse_filter::<Severity>("severity", Some(" ")).unwrap(), None);
        assert_eq!(
            parse_filter::<Status>("status", Some("in progress")).unwrap(),
            Some(Status::InProgress)
        );
        assert_eq!(
            parse_filter::<Status>("status", Some("Investigating")).unwrap(),
            Some(Status::InProgress)
        );
        let err = parse_filter::<Severity>("severity", Some("extreme")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().starts_with("severity:"));
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(LimitQuery::default().limit(), DEFAULT_LIMIT);
        assert_eq!(LimitQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(LimitQuery { limit: Some(5000) }.limit(), MAX_LIMIT);
    }
}
