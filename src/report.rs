use std::fmt::Write;
use std::io;

use anyhow::Context;

use crate::directory::NormalizedRecord;
use crate::export::{format_date, ReportTable};
use crate::features::Feature;
use crate::record::StudentRecord;

/// Writes a projected table as CSV, header first.
pub fn write_csv<W: io::Write>(table: &ReportTable, writer: W) -> anyhow::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&table.header)
        .context("failed to write CSV header")?;
    for row in &table.rows {
        out.write_record(row).context("failed to write CSV row")?;
    }
    out.flush()?;
    Ok(())
}

/// Markdown dashboard for one feature over an already scoped/filtered view.
pub fn build_report<R: StudentRecord>(
    feature: &Feature<R>,
    viewer_label: &str,
    records: &[NormalizedRecord<'_, R>],
    limit: usize,
) -> String {
    let summaries = feature.summaries(records);
    let options = feature.options(records);
    let table = feature.table(records);

    let mut output = String::new();

    let _ = writeln!(output, "# {} report", title(feature.name));
    let _ = writeln!(
        output,
        "Generated for {} ({} records across {} students)",
        viewer_label,
        records.len(),
        summaries.len()
    );
    let _ = writeln!(output);

    for dimension in &options {
        let _ = writeln!(output, "## {}", dimension.label);
        if dimension.values.is_empty() {
            let _ = writeln!(output, "No values recorded.");
        } else {
            for tag in &dimension.values {
                let _ = writeln!(output, "- {}: {}", tag.value, tag.count);
            }
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "## Students needing attention");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students with records in this view.");
    } else {
        for summary in summaries.iter().take(limit) {
            let _ = writeln!(
                output,
                "- {} ({} {}) {} {} of {} records, latest {}",
                summary.student_name,
                summary.grade,
                summary.section,
                summary.notable_count,
                feature.notable_label,
                summary.total_count,
                format_date(summary.latest)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Records");

    if table.is_empty() {
        let _ = writeln!(output, "No records in this view.");
    } else {
        let _ = writeln!(output, "| {} |", table.header.join(" | "));
        let _ = writeln!(
            output,
            "|{}",
            table.header.iter().map(|_| "---|").collect::<String>()
        );
        for row in table.rows.iter().take(limit) {
            let cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
            let _ = writeln!(output, "| {} |", cells.join(" | "));
        }
    }

    output
}

fn title(name: &str) -> String {
    let mut chars = name.replace('-', " ").chars().collect::<Vec<_>>();
    if let Some(first) = chars.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    chars.into_iter().collect()
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}
