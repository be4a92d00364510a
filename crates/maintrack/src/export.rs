//! Read-only exports of a report and its follow-up chain.
//!
//! Three renders are provided: a CSV of the whole chain (oldest entry
//! first), a document outline of the chain (newest first, one level
//! deeper per ancestor) that an off-the-shelf word-processor writer can
//! consume, and a flat field listing of a single report for page-to-PDF
//! conversion. Every dereferenced relation tolerates null: a deleted
//! author renders as `N/A`, a missing problem type as empty.

use crate::error::{Error, Result};
use crate::model::Report;
use crate::storage::Storage;

/// Column headers of the chain CSV export: the report id plus the 11
/// import columns.
pub const CSV_HEADERS: [&str; 12] = [
    "Report ID",
    "Asset ID",
    "Asset Name",
    "Asset Description",
    "Author",
    "Entry Date",
    "Priority",
    "Status",
    "Work Order Number",
    "Problem Type",
    "Problem Description",
    "Recommended Action",
];

/// A report with its relations dereferenced for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedReport {
    report: Report,
    asset_name: String,
    asset_description: Option<String>,
    asset_display: String,
    author_name: Option<String>,
    problem_type_name: Option<String>,
}

fn resolve(storage: &Storage, report: Report) -> Result<ResolvedReport> {
    let asset = storage
        .get_asset(report.asset_id)?
        .ok_or_else(|| Error::not_found("asset", report.asset_id))?;
    let asset_display = storage.asset_display_name(report.asset_id)?;

    let author_name = match report.author_id {
        Some(author_id) => storage.get_user(author_id)?.map(|u| u.username),
        None => None,
    };

    let problem_type_name = match report.problem_type_id {
        Some(problem_type_id) => storage.get_problem_type(problem_type_id)?.map(|p| p.name),
        None => None,
    };

    Ok(ResolvedReport {
        report,
        asset_name: asset.name,
        asset_description: asset.description,
        asset_display,
        author_name,
        problem_type_name,
    })
}

/// Export a report's full follow-up chain as CSV, oldest entry first.
///
/// Produces a header row plus one row per chain entry, so a chain of
/// length N yields N+1 rows.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the report is absent, or an error if
/// traversal or writing fails.
pub fn export_chain_csv(storage: &Storage, report_id: i64) -> Result<String> {
    let mut chain = storage.report_chain(report_id)?;
    chain.reverse();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for report in chain {
        let resolved = resolve(storage, report)?;
        let report = &resolved.report;
        writer.write_record([
            report.id.unwrap_or_default().to_string(),
            report.asset_id.to_string(),
            resolved.asset_name.clone(),
            resolved.asset_description.clone().unwrap_or_default(),
            resolved.author_name.clone().unwrap_or_else(|| "N/A".to_string()),
            report.entry_date.format("%Y-%m-%d").to_string(),
            report.priority.to_string(),
            report.status.to_string(),
            report.work_order_number.clone().unwrap_or_default(),
            resolved.problem_type_name.clone().unwrap_or_default(),
            report.problem_description.clone(),
            report.recommended_action.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// One element of a document outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineItem {
    /// A heading at the given level (1 = top).
    Heading {
        /// Nesting level of the heading.
        level: usize,
        /// Heading text.
        text: String,
    },
    /// A body paragraph. An empty string is a spacing paragraph.
    Paragraph {
        /// Nesting level inherited from the enclosing heading.
        level: usize,
        /// Paragraph text.
        text: String,
    },
}

/// A document outline of a report chain, ready for a word-processor
/// writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    /// Items in document order.
    pub items: Vec<OutlineItem>,
}

impl Outline {
    /// Render the outline as plain text, indenting two spaces per
    /// nesting level.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            let (level, text) = match item {
                OutlineItem::Heading { level, text } => (*level, text),
                OutlineItem::Paragraph { level, text } => (*level, text),
            };
            for _ in 1..level {
                out.push_str("  ");
            }
            out.push_str(text);
            out.push('\n');
        }
        out
    }
}

/// Export a report's follow-up chain as a document outline, newest
/// entry first, each older entry one level deeper.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the report is absent, or an error if
/// traversal fails.
pub fn export_chain_outline(storage: &Storage, report_id: i64) -> Result<Outline> {
    let chain = storage.report_chain(report_id)?;
    let mut outline = Outline::default();

    for (depth, report) in chain.into_iter().enumerate() {
        let level = depth + 1;
        let id = report.id.unwrap_or_default();
        let previous_id = report.previous_entry_id;
        let resolved = resolve(storage, report)?;
        let report = &resolved.report;

        outline.items.push(OutlineItem::Heading {
            level,
            text: format!("Report {id}"),
        });
        for text in [
            format!("Asset ID: {}", report.asset_id),
            format!("Asset: {}", resolved.asset_display),
            format!(
                "Asset Description: {}",
                resolved.asset_description.clone().unwrap_or_default()
            ),
            format!(
                "Author: {}",
                resolved.author_name.clone().unwrap_or_else(|| "N/A".to_string())
            ),
            format!("Entry Date: {}", report.entry_date.format("%Y-%m-%d")),
            format!("Priority: {}", report.priority),
            format!("Status: {}", report.status),
            format!(
                "Work Order Number: {}",
                report.work_order_number.clone().unwrap_or_default()
            ),
            format!(
                "Problem Type: {}",
                resolved.problem_type_name.clone().unwrap_or_default()
            ),
            format!("Problem Description: {}", report.problem_description),
            format!(
                "Recommended Action: {}",
                report.recommended_action.clone().unwrap_or_default()
            ),
            String::new(),
        ] {
            outline.items.push(OutlineItem::Paragraph { level, text });
        }

        if let Some(previous_id) = previous_id {
            outline.items.push(OutlineItem::Heading {
                level,
                text: format!("Previous Report {previous_id}"),
            });
        }
    }

    Ok(outline)
}

/// A single report flattened to labelled fields, for a page template
/// that an external HTML-to-PDF converter renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRender {
    /// Document title, e.g. `Report 17`.
    pub title: String,
    /// Labelled field values in display order.
    pub fields: Vec<(String, String)>,
}

/// Render a single report (no chain) as labelled fields.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the report is absent.
pub fn render_report(storage: &Storage, report_id: i64) -> Result<ReportRender> {
    let report = storage
        .get_report(report_id)?
        .ok_or_else(|| Error::not_found("report", report_id))?;
    let resolved = resolve(storage, report)?;
    let report = &resolved.report;

    let fields = vec![
        ("Asset".to_string(), resolved.asset_display.clone()),
        (
            "Asset Description".to_string(),
            resolved.asset_description.clone().unwrap_or_default(),
        ),
        (
            "Author".to_string(),
            resolved.author_name.clone().unwrap_or_else(|| "N/A".to_string()),
        ),
        (
            "Entry Date".to_string(),
            report.entry_date.format("%Y-%m-%d").to_string(),
        ),
        ("Priority".to_string(), report.priority.to_string()),
        ("Status".to_string(), report.status.to_string()),
        (
            "Work Order Number".to_string(),
            report.work_order_number.clone().unwrap_or_default(),
        ),
        (
            "Problem Type".to_string(),
            resolved.problem_type_name.clone().unwrap_or_default(),
        ),
        (
            "Problem Description".to_string(),
            report.problem_description.clone(),
        ),
        (
            "Recommended Action".to_string(),
            report.recommended_action.clone().unwrap_or_default(),
        ),
    ];

    Ok(ReportRender {
        title: format!("Report {report_id}"),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Asset, Priority, Report, User};
    use chrono::NaiveDate;

    fn setup() -> (Storage, i64) {
        let storage = Storage::open_in_memory().unwrap();
        let asset = storage
            .insert_asset(&Asset::new(
                "Press 4",
                Some("hydraulic".to_string()),
                None,
                Priority::High,
            ))
            .unwrap();
        (storage, asset)
    }

    fn file_report(
        storage: &Storage,
        asset: i64,
        description: &str,
        date: NaiveDate,
        previous: Option<i64>,
    ) -> i64 {
        let mut report = Report::new(asset, None);
        report.problem_description = description.to_string();
        report.entry_date = date;
        report.previous_entry_id = previous;
        storage.insert_report(&report).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_csv_export_header_plus_chain_oldest_first() {
        let (storage, asset) = setup();
        let oldest = file_report(&storage, asset, "first", date(1), None);
        let middle = file_report(&storage, asset, "second", date(2), Some(oldest));
        let newest = file_report(&storage, asset, "third", date(3), Some(middle));

        let csv = export_chain_csv(&storage, newest).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        // Chain of length 3 produces 4 rows: header + entries.
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Report ID,Asset ID,Asset Name"));
        assert!(lines[1].contains("first"));
        assert!(lines[2].contains("second"));
        assert!(lines[3].contains("third"));
    }

    #[test]
    fn test_csv_export_single_report() {
        let (storage, asset) = setup();
        let id = file_report(&storage, asset, "only", date(1), None);

        let csv = export_chain_csv(&storage, id).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_csv_export_null_relations() {
        let (storage, asset) = setup();
        let id = file_report(&storage, asset, "no author", date(1), None);

        let csv = export_chain_csv(&storage, id).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("N/A"));
    }

    #[test]
    fn test_csv_export_resolves_relations() {
        let (storage, asset) = setup();
        let user_id = storage.insert_user(&User::new("alice")).unwrap();
        let (problem_type, _) = storage.get_or_create_problem_type("Electrical").unwrap();

        let mut report = Report::new(asset, Some(user_id));
        report.problem_description = "breaker trips".to_string();
        report.problem_type_id = problem_type.id;
        report.entry_date = date(5);
        let id = storage.insert_report(&report).unwrap();

        let csv = export_chain_csv(&storage, id).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("alice"));
        assert!(row.contains("Electrical"));
        assert!(row.contains("2024-03-05"));
        assert!(row.contains("Press 4"));
    }

    #[test]
    fn test_csv_export_missing_report() {
        let (storage, _) = setup();
        assert!(export_chain_csv(&storage, 999).unwrap_err().is_not_found());
    }

    #[test]
    fn test_outline_newest_first_with_deepening_levels() {
        let (storage, asset) = setup();
        let oldest = file_report(&storage, asset, "first", date(1), None);
        let newest = file_report(&storage, asset, "second", date(2), Some(oldest));

        let outline = export_chain_outline(&storage, newest).unwrap();

        let headings: Vec<(usize, String)> = outline
            .items
            .iter()
            .filter_map(|item| match item {
                OutlineItem::Heading { level, text } => Some((*level, text.clone())),
                OutlineItem::Paragraph { .. } => None,
            })
            .collect();

        assert_eq!(headings[0], (1, format!("Report {newest}")));
        assert_eq!(headings[1], (1, format!("Previous Report {oldest}")));
        assert_eq!(headings[2], (2, format!("Report {oldest}")));
    }

    #[test]
    fn test_outline_to_text_indents_by_level() {
        let (storage, asset) = setup();
        let oldest = file_report(&storage, asset, "first", date(1), None);
        let newest = file_report(&storage, asset, "second", date(2), Some(oldest));

        let text = export_chain_outline(&storage, newest).unwrap().to_text();
        assert!(text.contains(&format!("Report {newest}\n")));
        assert!(text.contains(&format!("  Report {oldest}\n")));
        assert!(text.contains("Problem Description: second"));
    }

    #[test]
    fn test_outline_tolerates_null_relations() {
        let (storage, asset) = setup();
        let id = file_report(&storage, asset, "bare", date(1), None);

        let text = export_chain_outline(&storage, id).unwrap().to_text();
        assert!(text.contains("Author: N/A"));
        assert!(text.contains("Problem Type: \n"));
    }

    #[test]
    fn test_render_report_fields() {
        let (storage, asset) = setup();
        let id = file_report(&storage, asset, "bearing noise", date(9), None);

        let render = render_report(&storage, id).unwrap();
        assert_eq!(render.title, format!("Report {id}"));

        let field = |label: &str| {
            render
                .fields
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(field("Asset"), "Press 4");
        assert_eq!(field("Entry Date"), "2024-03-09");
        assert_eq!(field("Problem Description"), "bearing noise");
        assert_eq!(field("Author"), "N/A");
    }

    #[test]
    fn test_render_report_uses_parent_display_name() {
        let (storage, parent) = setup();
        let child = storage
            .insert_asset(&Asset::new("Feeder", None, Some(parent), Priority::Med))
            .unwrap();
        let id = file_report(&storage, child, "jam", date(1), None);

        let render = render_report(&storage, id).unwrap();
        let asset_field = render
            .fields
            .iter()
            .find(|(l, _)| l == "Asset")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(asset_field, "Press 4 > Feeder");
    }

    #[test]
    fn test_render_missing_report() {
        let (storage, _) = setup();
        assert!(render_report(&storage, 999).unwrap_err().is_not_found());
    }
}
