//! Per-feature configuration of the shared record pipeline.
//!
//! Each record kind plugs its filter dimensions, its notable-count rule
//! and its export columns into [`Feature`]; everything else is shared.

use tracing::debug;

use crate::aggregate::{summarize, Notable};
use crate::directory::{normalize_all, NormalizedRecord, StudentDirectory};
use crate::export::{
    format_date, format_optional_instant, join_tags, project, Column, ReportTable,
};
use crate::filter::{filter_records, Dimension, MatchPolicy, Query};
use crate::frequency::frequency_index;
use crate::models::{
    Assignment, Dropout, Incident, NeeRecord, Permission, RiskFactor, StudentSummary, TagCount,
};
use crate::record::{StudentRecord, Tags};
use crate::scope::{scope_for_viewer, Viewer};
use crate::status::{IncidentStatus, PermissionStatus, RiskLevel};

pub struct Feature<R> {
    pub name: &'static str,
    pub notable_label: &'static str,
    pub dimensions: Vec<Dimension<R>>,
    pub notable: Notable<R>,
    pub columns: Vec<Column<R>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub key: &'static str,
    pub label: &'static str,
    pub values: Vec<TagCount>,
}

impl<R: StudentRecord> Feature<R> {
    pub fn dimension(&self, key: &str) -> Option<&Dimension<R>> {
        self.dimensions.iter().find(|dimension| dimension.key == key)
    }

    /// Normalize, scope to the viewer, apply the query, newest first.
    pub fn view<'a>(
        &self,
        records: &'a [R],
        directory: &StudentDirectory<'_>,
        viewer: &Viewer,
        assignments: &[Assignment],
        query: &Query,
    ) -> Vec<NormalizedRecord<'a, R>> {
        let normalized = normalize_all(records, directory);
        let scoped = scope_for_viewer(normalized, viewer, assignments);
        let in_scope = scoped.len();
        let mut filtered = filter_records(scoped, &self.dimensions, query);

        filtered.sort_by(|a, b| {
            b.record
                .recorded_on()
                .cmp(&a.record.recorded_on())
                .then_with(|| a.record.id().cmp(&b.record.id()))
        });

        debug!(
            feature = self.name,
            total = records.len(),
            in_scope,
            matched = filtered.len(),
            "built record view"
        );
        filtered
    }

    pub fn summaries(&self, records: &[NormalizedRecord<'_, R>]) -> Vec<StudentSummary> {
        summarize(records, &self.notable)
    }

    pub fn options(&self, records: &[NormalizedRecord<'_, R>]) -> Vec<FilterOptions> {
        self.dimensions
            .iter()
            .map(|dimension| FilterOptions {
                key: dimension.key,
                label: dimension.label,
                values: frequency_index(records, dimension.accessor),
            })
            .collect()
    }

    pub fn table(&self, records: &[NormalizedRecord<'_, R>]) -> ReportTable {
        project(records, &self.columns)
    }
}

fn student_name<R>(normalized: &NormalizedRecord<'_, R>) -> String {
    normalized.student.name.clone()
}

fn student_document<R>(normalized: &NormalizedRecord<'_, R>) -> String {
    normalized.student.document_id.clone().unwrap_or_default()
}

fn student_grade<R>(normalized: &NormalizedRecord<'_, R>) -> String {
    normalized.student.grade.clone()
}

fn student_section<R>(normalized: &NormalizedRecord<'_, R>) -> String {
    normalized.student.section.clone()
}

fn recorded_on<R: StudentRecord>(normalized: &NormalizedRecord<'_, R>) -> String {
    format_date(normalized.record.recorded_on())
}

// Incidents

fn incident_types(incident: &Incident) -> Tags<'_> {
    Tags::Many(&incident.incident_types)
}

fn incident_status(incident: &Incident) -> Tags<'_> {
    Tags::One(incident.status.as_str())
}

fn incident_pending(incident: &Incident) -> bool {
    incident.status == IncidentStatus::Pending
}

fn incident_types_cell(normalized: &NormalizedRecord<'_, Incident>) -> String {
    join_tags(&normalized.record.incident_types)
}

fn incident_status_cell(normalized: &NormalizedRecord<'_, Incident>) -> String {
    normalized.record.status.to_string()
}

fn incident_description_cell(normalized: &NormalizedRecord<'_, Incident>) -> String {
    normalized.record.description.clone()
}

fn incident_attended_cell(normalized: &NormalizedRecord<'_, Incident>) -> String {
    format_optional_instant(normalized.record.attended_at)
}

fn incident_resolution_cell(normalized: &NormalizedRecord<'_, Incident>) -> String {
    normalized.record.resolution_notes.clone().unwrap_or_default()
}

/// Incident type selections use ALL: every selected type must be on the incident.
pub fn incidents() -> Feature<Incident> {
    Feature {
        name: "incidents",
        notable_label: "pending",
        dimensions: vec![
            Dimension {
                key: "type",
                label: "Incident type",
                accessor: incident_types,
                policy: MatchPolicy::All,
            },
            Dimension {
                key: "status",
                label: "Status",
                accessor: incident_status,
                policy: MatchPolicy::Any,
            },
        ],
        notable: Notable::Matching(incident_pending),
        columns: vec![
            Column { label: "Date", value: recorded_on },
            Column { label: "Student", value: student_name },
            Column { label: "Document", value: student_document },
            Column { label: "Grade", value: student_grade },
            Column { label: "Section", value: student_section },
            Column { label: "Types", value: incident_types_cell },
            Column { label: "Status", value: incident_status_cell },
            Column { label: "Description", value: incident_description_cell },
            Column { label: "Attended on", value: incident_attended_cell },
            Column { label: "Resolution notes", value: incident_resolution_cell },
        ],
    }
}

// Permissions

fn permission_types(permission: &Permission) -> Tags<'_> {
    Tags::Many(&permission.permission_types)
}

fn permission_status(permission: &Permission) -> Tags<'_> {
    Tags::One(permission.status.as_str())
}

fn permission_pending(permission: &Permission) -> bool {
    permission.status == PermissionStatus::Pending
}

fn permission_types_cell(normalized: &NormalizedRecord<'_, Permission>) -> String {
    join_tags(&normalized.record.permission_types)
}

fn permission_from_cell(normalized: &NormalizedRecord<'_, Permission>) -> String {
    format_date(normalized.record.start_date)
}

fn permission_to_cell(normalized: &NormalizedRecord<'_, Permission>) -> String {
    format_date(normalized.record.end_date)
}

fn permission_reason_cell(normalized: &NormalizedRecord<'_, Permission>) -> String {
    normalized.record.reason.clone()
}

fn permission_status_cell(normalized: &NormalizedRecord<'_, Permission>) -> String {
    normalized.record.status.to_string()
}

fn permission_reviewed_cell(normalized: &NormalizedRecord<'_, Permission>) -> String {
    format_optional_instant(normalized.record.reviewed_at)
}

/// Permission type selections use ANY: one selected type is enough.
pub fn permissions() -> Feature<Permission> {
    Feature {
        name: "permissions",
        notable_label: "pending",
        dimensions: vec![
            Dimension {
                key: "type",
                label: "Permission type",
                accessor: permission_types,
                policy: MatchPolicy::Any,
            },
            Dimension {
                key: "status",
                label: "Status",
                accessor: permission_status,
                policy: MatchPolicy::Any,
            },
        ],
        notable: Notable::Matching(permission_pending),
        columns: vec![
            Column { label: "Requested on", value: recorded_on },
            Column { label: "Student", value: student_name },
            Column { label: "Document", value: student_document },
            Column { label: "Grade", value: student_grade },
            Column { label: "Section", value: student_section },
            Column { label: "Types", value: permission_types_cell },
            Column { label: "From", value: permission_from_cell },
            Column { label: "To", value: permission_to_cell },
            Column { label: "Reason", value: permission_reason_cell },
            Column { label: "Status", value: permission_status_cell },
            Column { label: "Reviewed on", value: permission_reviewed_cell },
        ],
    }
}

// Risk factors

fn risk_category(risk: &RiskFactor) -> Tags<'_> {
    Tags::One(&risk.category)
}

fn risk_level(risk: &RiskFactor) -> Tags<'_> {
    Tags::One(risk.level.as_str())
}

fn risk_high(risk: &RiskFactor) -> bool {
    risk.level == RiskLevel::High
}

fn risk_category_cell(normalized: &NormalizedRecord<'_, RiskFactor>) -> String {
    normalized.record.category.clone()
}

fn risk_level_cell(normalized: &NormalizedRecord<'_, RiskFactor>) -> String {
    normalized.record.level.to_string()
}

fn risk_notes_cell(normalized: &NormalizedRecord<'_, RiskFactor>) -> String {
    normalized.record.notes.clone()
}

pub fn risk_factors() -> Feature<RiskFactor> {
    Feature {
        name: "risk-factors",
        notable_label: "high risk",
        dimensions: vec![
            Dimension {
                key: "category",
                label: "Category",
                accessor: risk_category,
                policy: MatchPolicy::Any,
            },
            Dimension {
                key: "level",
                label: "Level",
                accessor: risk_level,
                policy: MatchPolicy::Any,
            },
        ],
        notable: Notable::Matching(risk_high),
        columns: vec![
            Column { label: "Evaluated on", value: recorded_on },
            Column { label: "Student", value: student_name },
            Column { label: "Document", value: student_document },
            Column { label: "Grade", value: student_grade },
            Column { label: "Section", value: student_section },
            Column { label: "Category", value: risk_category_cell },
            Column { label: "Level", value: risk_level_cell },
            Column { label: "Notes", value: risk_notes_cell },
        ],
    }
}

// Special-education needs

fn nee_diagnosis(record: &NeeRecord) -> Tags<'_> {
    Tags::One(&record.diagnosis)
}

fn nee_diagnosis_cell(normalized: &NormalizedRecord<'_, NeeRecord>) -> String {
    normalized.record.diagnosis.clone()
}

fn nee_support_cell(normalized: &NormalizedRecord<'_, NeeRecord>) -> String {
    normalized.record.support_needs.clone()
}

fn nee_notes_cell(normalized: &NormalizedRecord<'_, NeeRecord>) -> String {
    normalized.record.notes.clone()
}

pub fn nee_records() -> Feature<NeeRecord> {
    Feature {
        name: "nee",
        notable_label: "diagnoses",
        dimensions: vec![Dimension {
            key: "diagnosis",
            label: "Diagnosis",
            accessor: nee_diagnosis,
            policy: MatchPolicy::Any,
        }],
        notable: Notable::DistinctTags(nee_diagnosis),
        columns: vec![
            Column { label: "Evaluated on", value: recorded_on },
            Column { label: "Student", value: student_name },
            Column { label: "Document", value: student_document },
            Column { label: "Grade", value: student_grade },
            Column { label: "Section", value: student_section },
            Column { label: "Diagnosis", value: nee_diagnosis_cell },
            Column { label: "Support needs", value: nee_support_cell },
            Column { label: "Notes", value: nee_notes_cell },
        ],
    }
}

// Dropouts

fn dropout_reason(dropout: &Dropout) -> Tags<'_> {
    Tags::One(&dropout.reason)
}

fn dropout_reason_cell(normalized: &NormalizedRecord<'_, Dropout>) -> String {
    normalized.record.reason.clone()
}

fn dropout_notes_cell(normalized: &NormalizedRecord<'_, Dropout>) -> String {
    normalized.record.notes.clone()
}

pub fn dropouts() -> Feature<Dropout> {
    Feature {
        name: "dropouts",
        notable_label: "reasons",
        dimensions: vec![Dimension {
            key: "reason",
            label: "Reason",
            accessor: dropout_reason,
            policy: MatchPolicy::Any,
        }],
        notable: Notable::DistinctTags(dropout_reason),
        columns: vec![
            Column { label: "Dropout date", value: recorded_on },
            Column { label: "Student", value: student_name },
            Column { label: "Document", value: student_document },
            Column { label: "Grade", value: student_grade },
            Column { label: "Section", value: student_section },
            Column { label: "Reason", value: dropout_reason_cell },
            Column { label: "Notes", value: dropout_notes_cell },
        ],
    }
}
