//! Result rendering.
//!
//! Renders a [`Report`] as a plain text table, a Markdown document or JSON.
//! Text and Markdown output show one row per detail record with a column
//! for every category, followed by the totals.

use crate::cli::OutputFormat;
use crate::models::{AnalysisMode, PageDetail, Report, ReportMetadata};
use anyhow::Result;

/// Render `report` in the requested format.
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(generate_table_report(report)),
        OutputFormat::Markdown => Ok(generate_markdown_report(report)),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// Column headers: id, title, each category, total.
fn headers(report: &Report) -> Vec<String> {
    let mut headers = vec!["Page ID".to_string(), "Title".to_string()];
    headers.extend(report.result.totals.iter().map(|(c, _)| category_label(c)));
    headers.push("Total".to_string());
    headers
}

fn detail_cells(report: &Report, detail: &PageDetail) -> Vec<String> {
    let mut cells = vec![detail.page_id.clone(), detail.title.clone()];
    cells.extend(
        report
            .result
            .totals
            .iter()
            .map(|(c, _)| detail.counts.get(c).to_string()),
    );
    cells.push(detail.total().to_string());
    cells
}

fn total_cells(report: &Report) -> Vec<String> {
    let totals = &report.result.totals;
    let mut cells = vec!["TOTAL".to_string(), format!("{} pages", report.result.total_pages)];
    cells.extend(totals.iter().map(|(_, v)| v.to_string()));
    cells.push(totals.total().to_string());
    cells
}

/// `unit` -> `Unit`, `wdio` -> `WDIO`.
fn category_label(category: &str) -> String {
    match category {
        "wdio" => "WDIO".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn describe_target(metadata: &ReportMetadata) -> String {
    match metadata.mode {
        AnalysisMode::Space => format!("space {}", metadata.target),
        AnalysisMode::Pages => format!("pages {}", metadata.target),
    }
}

/// Generate a plain text table.
pub fn generate_table_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Test counts for {} ({})\n\n",
        describe_target(&report.metadata),
        report.metadata.base_url
    ));

    let headers = headers(report);
    let mut rows: Vec<Vec<String>> = report
        .result
        .page_details
        .iter()
        .map(|d| detail_cells(report, d))
        .collect();
    let totals = total_cells(report);

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows.iter().chain(std::iter::once(&totals)) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    output.push_str(&format_text_row(&headers, &widths));
    output.push_str(&separator);
    output.push('\n');

    if rows.is_empty() {
        output.push_str("(no pages with test counts)\n");
    }
    for row in rows.drain(..) {
        output.push_str(&format_text_row(&row, &widths));
    }

    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format_text_row(&totals, &widths));

    output
}

/// Left-align the first two columns, right-align the counts.
fn format_text_row(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i < 2 {
                format!("{:<width$}", cell, width = width)
            } else {
                format!("{:>width$}", cell, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}\n", line.trim_end())
}

/// Generate a Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Test Count Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    // Summary
    output.push_str("## Summary\n\n");
    output.push_str("| Category | Count |\n");
    output.push_str("|:---|---:|\n");
    for (category, value) in report.result.totals.iter() {
        output.push_str(&format!("| {} | {} |\n", category_label(category), value));
    }
    output.push_str(&format!(
        "| **Total** | **{}** |\n\n",
        report.result.totals.total()
    ));
    output.push_str(&format!(
        "Pages analyzed: **{}**\n\n",
        report.result.total_pages
    ));

    // Details
    output.push_str("## Pages\n\n");
    if report.result.page_details.is_empty() {
        output.push_str("No pages with test counts were found.\n\n");
        return output;
    }

    let headers = headers(report);
    output.push_str(&format!("| {} |\n", headers.join(" | ")));
    let align: Vec<&str> = (0..headers.len())
        .map(|i| if i < 2 { ":---" } else { "---:" })
        .collect();
    output.push_str(&format!("|{}|\n", align.join("|")));

    for detail in &report.result.page_details {
        let cells: Vec<String> = detail_cells(report, detail)
            .into_iter()
            .map(|c| escape_markdown_cell(&c))
            .collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    output.push('\n');

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Site:** {}\n", metadata.base_url));
    section.push_str(&format!("- **Target:** {}\n", describe_target(metadata)));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn escape_markdown_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
