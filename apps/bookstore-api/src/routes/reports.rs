//! # Report Routes
//!
//! ```text
//! GET /reports?range=monthly&type=overview            → Report (JSON)
//! GET /reports/export?range=&type=&format=xlsx|json   → attachment
//! GET /dashboard                                       → DashboardCounts
//! ```
//!
//! Missing selectors fall back to `monthly` / `overview` / `xlsx`. Unknown
//! values are a 400.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::export::{export_report, ExportFormat};
use crate::SharedState;
use bookstore_core::report::{DateRange, Report, ReportType};
use bookstore_core::DashboardCounts;

/// Raw query string. Parsed by hand so bad values get our error body.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub range: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub format: Option<String>,
}

impl ReportQuery {
    fn selectors(&self) -> ApiResult<(DateRange, ReportType)> {
        let range = parse_or_default(self.range.as_deref())?;
        let report_type = parse_or_default(self.report_type.as_deref())?;
        Ok((range, report_type))
    }

    fn format(&self) -> ApiResult<ExportFormat> {
        parse_or_default(self.format.as_deref())
    }
}

fn parse_or_default<T>(value: Option<&str>) -> ApiResult<T>
where
    T: std::str::FromStr + Default,
    ApiError: From<T::Err>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v.parse()?),
        None => Ok(T::default()),
    }
}

async fn build(state: &SharedState, query: &ReportQuery) -> ApiResult<Report> {
    let (range, report_type) = query.selectors()?;
    debug!(%range, %report_type, "Building report");

    let report = state
        .db
        .reports()
        .build(range, report_type, Utc::now(), &state.config.report_options())
        .await?;
    Ok(report)
}

/// `GET /reports`
pub async fn get_report(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Report>> {
    Ok(Json(build(&state, &query).await?))
}

/// `GET /reports/export`
pub async fn export(
    auth: AuthenticatedUser,
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let format = query.format()?;
    let report = build(&state, &query).await?;
    let export = export_report(&report, format, &state.config.currency)?;

    info!(
        file = %export.file_name,
        bytes = export.bytes.len(),
        user_id = auth.user.user_id,
        "Report exported"
    );

    let disposition = format!("attachment; filename=\"{}\"", export.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    )
        .into_response())
}

/// `GET /dashboard`
pub async fn dashboard(
    _auth: AuthenticatedUser,
    State(state): State<SharedState>,
) -> ApiResult<Json<DashboardCounts>> {
    Ok(Json(state.db.dashboard().counts().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(range: Option<&str>, report_type: Option<&str>, format: Option<&str>) -> ReportQuery {
        ReportQuery {
            range: range.map(String::from),
            report_type: report_type.map(String::from),
            format: format.map(String::from),
        }
    }

    #[test]
    fn test_selectors_default() {
        let (range, report_type) = ReportQuery::default().selectors().unwrap();
        assert_eq!(range, DateRange::Monthly);
        assert_eq!(report_type, ReportType::Overview);
        assert_eq!(ReportQuery::default().format().unwrap(), ExportFormat::Xlsx);
    }

    #[test]
    fn test_selectors_parse() {
        let q = query(Some("Quarterly"), Some("inventory"), Some("json"));
        assert_eq!(q.selectors().unwrap(), (DateRange::Quarterly, ReportType::Inventory));
        assert_eq!(q.format().unwrap(), ExportFormat::Json);
    }

    #[test]
    fn test_blank_selector_uses_default() {
        let q = query(Some(" "), None, None);
        assert_eq!(q.selectors().unwrap().0, DateRange::Monthly);
    }

    #[test]
    fn test_unknown_selector_is_validation_error() {
        let err = query(Some("weekly"), None, None).selectors().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
        assert!(err.message.contains("range"));
    }
}
