//! Student lookup and record normalization.
//!
//! Records only carry a student id; the directory resolves it to the
//! display fields shown next to every record. Missing references never
//! fail: the record keeps flowing with sentinel display values.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Grade, Snapshot, Student};
use crate::record::StudentRecord;

pub const UNKNOWN_STUDENT: &str = "Unknown student";
pub const UNASSIGNED: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentView {
    pub student_id: Uuid,
    pub name: String,
    pub document_id: Option<String>,
    pub grade: String,
    pub section: String,
    pub grade_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
}

impl StudentView {
    pub fn is_known(&self) -> bool {
        self.document_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord<'a, R> {
    pub record: &'a R,
    pub student: StudentView,
}

pub struct StudentDirectory<'a> {
    students: HashMap<Uuid, &'a Student>,
    grade_names: HashMap<Uuid, &'a str>,
    section_names: HashMap<Uuid, &'a str>,
}

impl<'a> StudentDirectory<'a> {
    pub fn new(students: &'a [Student], grades: &'a [Grade]) -> Self {
        let mut grade_names = HashMap::new();
        let mut section_names = HashMap::new();

        for grade in grades {
            grade_names.insert(grade.id, grade.name.as_str());
            for section in &grade.sections {
                section_names.insert(section.id, section.name.as_str());
            }
        }

        Self {
            students: students.iter().map(|student| (student.id, student)).collect(),
            grade_names,
            section_names,
        }
    }

    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        Self::new(&snapshot.students, &snapshot.grades)
    }

    pub fn get(&self, student_id: Uuid) -> Option<&'a Student> {
        self.students.get(&student_id).copied()
    }

    pub fn view(&self, student_id: Uuid) -> StudentView {
        let Some(student) = self.get(student_id) else {
            return StudentView {
                student_id,
                name: UNKNOWN_STUDENT.to_string(),
                document_id: None,
                grade: UNASSIGNED.to_string(),
                section: UNASSIGNED.to_string(),
                grade_id: None,
                section_id: None,
            };
        };

        let grade = student
            .grade_id
            .and_then(|id| self.grade_names.get(&id))
            .unwrap_or(&UNASSIGNED);
        let section = student
            .section_id
            .and_then(|id| self.section_names.get(&id))
            .unwrap_or(&UNASSIGNED);

        StudentView {
            student_id,
            name: student.display_name(),
            document_id: Some(student.document_id.clone()),
            grade: grade.to_string(),
            section: section.to_string(),
            grade_id: student.grade_id,
            section_id: student.section_id,
        }
    }
}

pub fn normalize<'a, R: StudentRecord>(
    record: &'a R,
    directory: &StudentDirectory<'_>,
) -> NormalizedRecord<'a, R> {
    NormalizedRecord {
        record,
        student: directory.view(record.student_id()),
    }
}

pub fn normalize_all<'a, R: StudentRecord>(
    records: &'a [R],
    directory: &StudentDirectory<'_>,
) -> Vec<NormalizedRecord<'a, R>> {
    records
        .iter()
        .map(|record| normalize(record, directory))
        .collect()
}
