//! Flattens records into header + rows for the spreadsheet/document writers.
//!
//! Dates stored in the records are bare calendar dates, so they are
//! rendered as-is; instants are converted to a calendar date in UTC.
//! Never go through the local time zone here: it shifts dates by one day
//! west of Greenwich.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::directory::NormalizedRecord;

pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub struct Column<R> {
    pub label: &'static str,
    pub value: fn(&NormalizedRecord<'_, R>) -> String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn project<R>(records: &[NormalizedRecord<'_, R>], columns: &[Column<R>]) -> ReportTable {
    ReportTable {
        header: columns.iter().map(|column| column.label.to_string()).collect(),
        rows: records
            .iter()
            .map(|record| columns.iter().map(|column| (column.value)(record)).collect())
            .collect(),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_instant_date(at: DateTime<Utc>) -> String {
    format_date(at.date_naive())
}

pub fn format_optional_instant(at: Option<DateTime<Utc>>) -> String {
    at.map(format_instant_date).unwrap_or_default()
}

pub fn join_tags(values: &[String]) -> String {
    values.join(", ")
}
