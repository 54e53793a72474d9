//! Role-based visibility.
//!
//! Docente and Auxiliar staff only see students in the grade/section
//! pairs they are assigned to. Every other role sees everything.

use std::collections::HashSet;

use uuid::Uuid;

use crate::directory::NormalizedRecord;
use crate::models::{Assignment, StaffRole};

pub fn is_restricted_role(role: StaffRole) -> bool {
    matches!(role, StaffRole::Docente | StaffRole::Auxiliar)
}

/// The acting staff member, as handed over by the session provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub staff_id: Uuid,
    pub restricted: bool,
}

impl Viewer {
    pub fn new(staff_id: Uuid, role: StaffRole) -> Self {
        Self {
            staff_id,
            restricted: is_restricted_role(role),
        }
    }

    pub fn unrestricted(staff_id: Uuid) -> Self {
        Self {
            staff_id,
            restricted: false,
        }
    }
}

/// `(grade_id, section_id)` pairs assigned to `staff_id`.
pub fn assigned_sections(staff_id: Uuid, assignments: &[Assignment]) -> HashSet<(Uuid, Uuid)> {
    assignments
        .iter()
        .filter(|assignment| assignment.staff_id == staff_id)
        .map(|assignment| (assignment.grade_id, assignment.section_id))
        .collect()
}

pub fn scope_filter<'a, R>(
    records: Vec<NormalizedRecord<'a, R>>,
    staff_id: Uuid,
    restricted: bool,
    assignments: &[Assignment],
) -> Vec<NormalizedRecord<'a, R>> {
    if !restricted {
        return records;
    }

    let sections = assigned_sections(staff_id, assignments);
    if sections.is_empty() {
        return Vec::new();
    }

    records
        .into_iter()
        .filter(|record| match (record.student.grade_id, record.student.section_id) {
            (Some(grade_id), Some(section_id)) => sections.contains(&(grade_id, section_id)),
            (None, Some(section_id)) => sections.iter().any(|(_, id)| *id == section_id),
            _ => false,
        })
        .collect()
}

pub fn scope_for_viewer<'a, R>(
    records: Vec<NormalizedRecord<'a, R>>,
    viewer: &Viewer,
    assignments: &[Assignment],
) -> Vec<NormalizedRecord<'a, R>> {
    scope_filter(records, viewer.staff_id, viewer.restricted, assignments)
}
