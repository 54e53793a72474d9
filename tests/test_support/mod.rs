#![allow(dead_code)]

use chrono::NaiveDate;
use uuid::Uuid;

use school_records_triage::models::{
    Assignment, Grade, Incident, Permission, RiskFactor, Section, Snapshot, StaffProfile,
    StaffRole, Student,
};
use school_records_triage::status::{IncidentStatus, PermissionStatus, RiskLevel};

pub struct School {
    pub snapshot: Snapshot,
    pub grade_id: Uuid,
    pub section_a: Uuid,
    pub section_b: Uuid,
    pub ana: Uuid,
    pub luis: Uuid,
    pub teacher: Uuid,
    pub director: Uuid,
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, d).expect("valid day")
}

pub fn incident(student_id: Uuid, d: u32, types: &[&str], status: IncidentStatus) -> Incident {
    Incident {
        id: Uuid::new_v4(),
        student_id,
        incident_date: day(d),
        incident_types: types.iter().map(|t| t.to_string()).collect(),
        description: "Reported by the homeroom teacher".to_string(),
        reported_by: None,
        status,
        attended_by: None,
        attended_at: None,
        resolution_notes: None,
    }
}

pub fn permission(student_id: Uuid, d: u32, types: &[&str], status: PermissionStatus) -> Permission {
    Permission {
        id: Uuid::new_v4(),
        student_id,
        request_date: day(d),
        permission_types: types.iter().map(|t| t.to_string()).collect(),
        start_date: day(d),
        end_date: day(d + 1),
        reason: "Family matter".to_string(),
        status,
        reviewed_by: None,
        reviewed_at: None,
    }
}

pub fn risk(student_id: Uuid, category: &str, level: RiskLevel) -> RiskFactor {
    RiskFactor {
        id: Uuid::new_v4(),
        student_id,
        evaluation_date: day(5),
        category: category.to_string(),
        level,
        notes: String::new(),
    }
}

/// Ana sits in section A, Luis in section B; the Docente is assigned to A only.
pub fn school() -> School {
    let grade_id = Uuid::new_v4();
    let section_a = Uuid::new_v4();
    let section_b = Uuid::new_v4();
    let ana = Uuid::new_v4();
    let luis = Uuid::new_v4();
    let teacher = Uuid::new_v4();
    let director = Uuid::new_v4();

    let snapshot = Snapshot {
        students: vec![
            Student {
                id: ana,
                first_name: "Ana".to_string(),
                last_name: "López".to_string(),
                document_id: "70112233".to_string(),
                grade_id: Some(grade_id),
                section_id: Some(section_a),
            },
            Student {
                id: luis,
                first_name: "Luis".to_string(),
                last_name: "Quispe".to_string(),
                document_id: "70445566".to_string(),
                grade_id: Some(grade_id),
                section_id: Some(section_b),
            },
        ],
        grades: vec![Grade {
            id: grade_id,
            name: "1st".to_string(),
            sections: vec![
                Section {
                    id: section_a,
                    grade_id,
                    name: "A".to_string(),
                },
                Section {
                    id: section_b,
                    grade_id,
                    name: "B".to_string(),
                },
            ],
        }],
        assignments: vec![Assignment {
            staff_id: teacher,
            grade_id,
            section_id: section_a,
        }],
        staff: vec![
            StaffProfile {
                id: teacher,
                name: "Jorge Salazar".to_string(),
                email: "jorge.salazar@school.edu.pe".to_string(),
                role: StaffRole::Docente,
                document_id: Some("40556677".to_string()),
            },
            StaffProfile {
                id: director,
                name: "Carmen Rojas".to_string(),
                email: "carmen.rojas@school.edu.pe".to_string(),
                role: StaffRole::Director,
                document_id: None,
            },
        ],
        ..Snapshot::default()
    };

    School {
        snapshot,
        grade_id,
        section_a,
        section_b,
        ana,
        luis,
        teacher,
        director,
    }
}
