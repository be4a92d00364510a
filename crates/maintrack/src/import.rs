//! CSV import for report batches.
//!
//! Parses the fixed 11-column row format shared with the CSV export
//! (minus the leading report id): asset id, asset name, asset
//! description, author, entry date, priority, status, work order,
//! problem type, problem description, recommended action. The first
//! row is discarded as a header. Row failures are collected and never
//! abort the batch; each imported row chains to the report created from
//! the row before it, in file order.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::error::{Error, Result};
use crate::model::{Report, User};
use crate::storage::Storage;

/// Number of data columns in an import row.
const IMPORT_COLUMNS: usize = 11;

/// Outcome of an import batch: how many rows landed, which rows failed,
/// and which rows imported with a substituted value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Ids of the reports created, in file order.
    pub report_ids: Vec<i64>,
    /// Per-row failure messages. A failed row is skipped; later rows
    /// still import.
    pub errors: Vec<String>,
    /// Per-row warnings for rows that imported with a substitution
    /// (currently only unparsed entry dates).
    pub warnings: Vec<String>,
}

impl ImportSummary {
    /// Number of reports created.
    #[must_use]
    pub fn imported(&self) -> usize {
        self.report_ids.len()
    }

    /// Check if every row imported without errors or warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Import a CSV batch on behalf of the given user.
///
/// Every created report is authored by `author` regardless of the
/// row's author column, and rows chain in file order: each report's
/// previous entry points at the report created from the row before it,
/// across the whole batch.
///
/// # Errors
///
/// Returns an error only when the reader itself fails; row-level
/// problems are collected in the returned summary.
pub fn import_reports_csv(
    storage: &Storage,
    author: &User,
    config: &ImportConfig,
    data: &str,
) -> Result<ImportSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut summary = ImportSummary::default();
    let mut previous_report: Option<i64> = None;

    for (index, record) in reader.records().enumerate() {
        let row_number = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                summary
                    .errors
                    .push(Error::import_row(row_number, e.to_string()).to_string());
                continue;
            }
        };

        match import_row(storage, author, config, row_number, &record, previous_report) {
            Ok(outcome) => {
                if let Some(warning) = outcome.warning {
                    summary.warnings.push(warning);
                }
                previous_report = Some(outcome.report_id);
                summary.report_ids.push(outcome.report_id);
            }
            Err(e) => {
                warn!("Import row {} failed: {}", row_number, e);
                summary.errors.push(e.to_string());
            }
        }
    }

    info!(
        "Imported {} reports ({} errors, {} warnings)",
        summary.imported(),
        summary.errors.len(),
        summary.warnings.len()
    );
    Ok(summary)
}

struct RowOutcome {
    report_id: i64,
    warning: Option<String>,
}

fn import_row(
    storage: &Storage,
    author: &User,
    config: &ImportConfig,
    row_number: usize,
    record: &csv::StringRecord,
    previous_report: Option<i64>,
) -> Result<RowOutcome> {
    if record.len() != IMPORT_COLUMNS {
        return Err(Error::import_row(
            row_number,
            format!("expected {IMPORT_COLUMNS} columns, got {}", record.len()),
        ));
    }

    let field = |i: usize| record.get(i).unwrap_or_default().trim();

    let asset_id: i64 = field(0).parse().map_err(|_| {
        Error::import_row(row_number, format!("invalid asset id '{}'", field(0)))
    })?;

    let description = non_empty(field(2));
    let (asset, _created) =
        storage.get_or_create_asset(asset_id, field(1), description.as_deref())?;

    // Column 3 is the exporting system's author name; imported rows are
    // always attributed to the acting user instead.
    let problem_type_id = match non_empty(field(8)) {
        Some(name) => Some(
            storage
                .get_or_create_problem_type(&name)?
                .0
                .id
                .ok_or_else(|| Error::not_found("problem type", 0))?,
        ),
        None => None,
    };

    let (entry_date, warning) = parse_entry_date(field(4), config, row_number)?;

    let mut report = Report::new(asset.id.unwrap_or(asset_id), author.id);
    report.entry_date = entry_date;
    report.priority = field(5)
        .parse()
        .map_err(|e: Error| Error::import_row(row_number, e.to_string()))?;
    report.status = field(6)
        .parse()
        .map_err(|e: Error| Error::import_row(row_number, e.to_string()))?;
    report.work_order_number = non_empty(field(7));
    report.problem_type_id = problem_type_id;
    report.problem_description = field(9).to_string();
    report.recommended_action = non_empty(field(10));
    report.previous_entry_id = previous_report;

    let report_id = storage
        .insert_report(&report)
        .map_err(|e| Error::import_row(row_number, e.to_string()))?;

    Ok(RowOutcome { report_id, warning })
}

/// Parse the entry-date column. A malformed date normally falls back to
/// today with a warning in the summary; with `strict_dates` set it
/// fails the row instead.
fn parse_entry_date(
    value: &str,
    config: &ImportConfig,
    row_number: usize,
) -> Result<(NaiveDate, Option<String>)> {
    match NaiveDate::parse_from_str(value, &config.date_format) {
        Ok(date) => Ok((date, None)),
        Err(_) if config.strict_dates => Err(Error::import_row(
            row_number,
            format!("unparsed entry date '{value}'"),
        )),
        Err(_) => {
            let today = Utc::now().date_naive();
            let warning = format!(
                "row {row_number}: unparsed entry date '{value}', substituted {today}"
            );
            Ok((today, Some(warning)))
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
