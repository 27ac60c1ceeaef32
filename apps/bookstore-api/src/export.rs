//! # Report Export
//!
//! Turns a [`Report`] into a downloadable file.
//!
//! ```text
//! Report ──► xlsx workbook (one sheet per non-empty dataset)
//!               │
//!               ├── ok    → bookstore-report-<type>-<range>-<date>.xlsx
//!               └── error → same report as JSON  (.json)
//! ```
//!
//! Money columns are written as numbers in major units with a `#,##0.00`
//! format, so the spreadsheet can sum them.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use bookstore_core::report::Report;
use bookstore_core::ValidationError;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Requested download format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ValidationError::NotAllowed {
                field: "format".to_string(),
                allowed: vec!["xlsx".to_string(), "json".to_string()],
            }),
        }
    }
}

/// A rendered download.
#[derive(Debug, Clone)]
pub struct Export {
    pub content_type: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Workbook renderer: report and currency label in, xlsx bytes out.
type Renderer = fn(&Report, &str) -> Result<Vec<u8>, XlsxError>;

/// Renders `report` in `format`, falling back to JSON when the workbook
/// cannot be produced.
pub fn export_report(report: &Report, format: ExportFormat, currency: &str) -> ApiResult<Export> {
    export_with(report, format, currency, report_workbook)
}

fn export_with(
    report: &Report,
    format: ExportFormat,
    currency: &str,
    render: Renderer,
) -> ApiResult<Export> {
    if format == ExportFormat::Xlsx {
        match render(report, currency) {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "Workbook generated");
                return Ok(Export {
                    content_type: XLSX_CONTENT_TYPE,
                    file_name: file_name(report, "xlsx"),
                    bytes,
                });
            }
            Err(e) => warn!(error = %e, "Workbook generation failed, exporting JSON instead"),
        }
    }

    let bytes = serde_json::to_vec_pretty(report).map_err(ApiError::internal)?;
    Ok(Export {
        content_type: JSON_CONTENT_TYPE,
        file_name: file_name(report, "json"),
        bytes,
    })
}

fn file_name(report: &Report, extension: &str) -> String {
    format!(
        "bookstore-report-{}-{}-{}.{}",
        report.report_type,
        report.range,
        report.generated_at.format("%Y%m%d"),
        extension
    )
}

// =============================================================================
// Workbook
// =============================================================================

/// One spreadsheet cell.
enum Cell {
    Text(String),
    OptText(Option<String>),
    Int(i64),
    Money(i64),
    Ratio(Option<f64>),
}

/// Builds the workbook bytes. Datasets with no rows get no sheet; a report
/// with nothing at all gets a single "Report" sheet with its header.
pub fn report_workbook(report: &Report, currency: &str) -> Result<Vec<u8>, XlsxError> {
    let mut sheets = Vec::new();
    let money = |label: &str| format!("{} ({})", label, currency);

    if let Some(s) = &report.summary {
        let rows = vec![
            vec![Cell::Text(money("Total revenue")), Cell::Money(s.total_revenue_cents)],
            vec![Cell::Text("Orders".into()), Cell::Int(s.orders)],
            vec![Cell::Text("Customers".into()), Cell::Int(s.customers)],
            vec![Cell::Text(money("Average order value")), Cell::Money(s.average_order_value_cents)],
            vec![Cell::Text("Units sold".into()), Cell::Int(s.units_sold)],
            vec![Cell::Text("Books in catalogue".into()), Cell::Int(s.books)],
            vec![Cell::Text("Units in stock".into()), Cell::Int(s.units_in_stock)],
            vec![Cell::Text("Low-stock books".into()), Cell::Int(s.low_stock)],
        ];
        sheets.push(table_sheet("Summary", &["Metric", "Value"], rows)?);
    }

    if !report.periods.is_empty() {
        let rows = report
            .periods
            .iter()
            .map(|p| {
                vec![
                    Cell::Text(p.period.clone()),
                    Cell::Money(p.revenue_cents),
                    Cell::Int(p.orders),
                    Cell::Int(p.customers),
                ]
            })
            .collect();
        sheets.push(table_sheet(
            "Sales by Period",
            &["Period", &money("Revenue"), "Orders", "Customers"],
            rows,
        )?);
    }

    if !report.categories.is_empty() {
        let rows = report
            .categories
            .iter()
            .map(|c| {
                vec![
                    Cell::Text(c.name.clone()),
                    Cell::Int(c.units_sold),
                    Cell::Money(c.revenue_cents),
                ]
            })
            .collect();
        sheets.push(table_sheet(
            "Categories",
            &["Category", "Units sold", &money("Revenue")],
            rows,
        )?);
    }

    if !report.top_books.is_empty() {
        let rows = report
            .top_books
            .iter()
            .map(|b| {
                vec![
                    Cell::Text(b.title.clone()),
                    Cell::OptText(b.author.clone()),
                    Cell::Int(b.sold),
                    Cell::Money(b.revenue_cents),
                    Cell::Int(b.orders),
                ]
            })
            .collect();
        sheets.push(table_sheet(
            "Top Books",
            &["Title", "Author", "Copies sold", &money("Revenue"), "Orders"],
            rows,
        )?);
    }

    if !report.inventory.is_empty() {
        let rows = report
            .inventory
            .iter()
            .map(|i| {
                vec![
                    Cell::Text(i.title.clone()),
                    Cell::OptText(i.author.clone()),
                    Cell::OptText(i.category.clone()),
                    Cell::Int(i.stock_quantity),
                    Cell::Int(i.units_sold),
                    Cell::Ratio(i.turnover_ratio),
                    Cell::Text(i.status.label().to_string()),
                ]
            })
            .collect();
        sheets.push(table_sheet(
            "Inventory",
            &["Title", "Author", "Category", "Stock", "Units sold", "Turnover", "Status"],
            rows,
        )?);
    }

    if !report.customers.is_empty() {
        let rows = report
            .customers
            .iter()
            .map(|c| {
                vec![
                    Cell::Text(c.name.clone()),
                    Cell::OptText(c.email.clone()),
                    Cell::Int(c.orders),
                    Cell::Money(c.total_spent_cents),
                    Cell::Text(c.last_order_date.format("%Y-%m-%d").to_string()),
                ]
            })
            .collect();
        sheets.push(table_sheet(
            "Customers",
            &["Name", "Email", "Orders", &money("Total spent"), "Last order"],
            rows,
        )?);
    }

    if sheets.is_empty() {
        let rows = vec![
            vec![Cell::Text("Report".into()), Cell::Text(report.report_type.to_string())],
            vec![Cell::Text("Range".into()), Cell::Text(report.range.to_string())],
            vec![
                Cell::Text("Generated".into()),
                Cell::Text(report.generated_at.to_rfc3339()),
            ],
        ];
        sheets.push(table_sheet("Report", &["Field", "Value"], rows)?);
    }

    let mut workbook = Workbook::new();
    for sheet in sheets {
        workbook.push_worksheet(sheet);
    }
    workbook.save_to_buffer()
}

fn table_sheet(name: &str, headers: &[&str], rows: Vec<Vec<Cell>>) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(name)?;

    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");
    let ratio = Format::new().set_num_format("0.00");

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (r, row) in rows.into_iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, cell) in row.into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(r, col, text)?;
                }
                Cell::OptText(Some(text)) => {
                    sheet.write_string(r, col, text)?;
                }
                Cell::OptText(None) | Cell::Ratio(None) => {}
                Cell::Int(n) => {
                    sheet.write_number(r, col, n as f64)?;
                }
                Cell::Money(cents) => {
                    sheet.write_number_with_format(r, col, cents as f64 / 100.0, &money)?;
                }
                Cell::Ratio(Some(x)) => {
                    sheet.write_number_with_format(r, col, x, &ratio)?;
                }
            }
        }
    }

    sheet.autofit();
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_core::report::{build_report, DateRange, ReportData, ReportOptions, ReportType};
    use chrono::Utc;

    fn empty_report(report_type: ReportType) -> Report {
        build_report(
            DateRange::Monthly,
            report_type,
            Utc::now(),
            &ReportData::default(),
            &ReportOptions::default(),
        )
    }

    #[test]
    fn test_xlsx_export_is_a_zip() {
        let export = export_report(&empty_report(ReportType::Overview), ExportFormat::Xlsx, "UGX").unwrap();
        assert_eq!(export.content_type, XLSX_CONTENT_TYPE);
        assert!(export.file_name.starts_with("bookstore-report-overview-monthly-"));
        assert!(export.file_name.ends_with(".xlsx"));
        // xlsx files are zip archives
        assert_eq!(&export.bytes[..2], b"PK");
    }

    #[test]
    fn test_report_with_no_datasets_still_has_a_sheet() {
        let bytes = report_workbook(&empty_report(ReportType::Customers), "UGX").unwrap();
        assert!(!bytes.is_empty());
    }

    fn broken_workbook(_: &Report, _: &str) -> Result<Vec<u8>, XlsxError> {
        Worksheet::new().set_name("bad[name]")?;
        Ok(Vec::new())
    }

    #[test]
    fn test_failed_workbook_falls_back_to_json() {
        let report = empty_report(ReportType::Inventory);
        let export = export_with(&report, ExportFormat::Xlsx, "UGX", broken_workbook).unwrap();
        assert_eq!(export.content_type, JSON_CONTENT_TYPE);
        assert!(export.file_name.starts_with("bookstore-report-inventory-monthly-"));
        assert!(export.file_name.ends_with(".json"));

        let back: serde_json::Value = serde_json::from_slice(&export.bytes).unwrap();
        assert_eq!(back["report_type"], "inventory");
    }

    #[test]
    fn test_json_export() {
        let report = empty_report(ReportType::Sales);
        let export = export_report(&report, ExportFormat::Json, "UGX").unwrap();
        assert_eq!(export.content_type, JSON_CONTENT_TYPE);

        let back: serde_json::Value = serde_json::from_slice(&export.bytes).unwrap();
        assert_eq!(back["report_type"], "sales");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("csv".parse::<ExportFormat>().is_err());
    }
}
