use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{IncidentStatus, PermissionStatus, RiskLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub document_id: String,
    pub grade_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub grade_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// One staff member bound to one grade/section pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub staff_id: Uuid,
    pub grade_id: Uuid,
    pub section_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Admin,
    Director,
    Subdirector,
    Coordinador,
    Docente,
    Auxiliar,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "Admin",
            StaffRole::Director => "Director",
            StaffRole::Subdirector => "Subdirector",
            StaffRole::Coordinador => "Coordinador",
            StaffRole::Docente => "Docente",
            StaffRole::Auxiliar => "Auxiliar",
        }
    }

    pub fn parse(value: &str) -> Option<StaffRole> {
        match value.trim() {
            "Admin" => Some(StaffRole::Admin),
            "Director" => Some(StaffRole::Director),
            "Subdirector" => Some(StaffRole::Subdirector),
            "Coordinador" => Some(StaffRole::Coordinador),
            "Docente" => Some(StaffRole::Docente),
            "Auxiliar" => Some(StaffRole::Auxiliar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub student_id: Uuid,
    pub incident_date: NaiveDate,
    pub incident_types: Vec<String>,
    pub description: String,
    pub reported_by: Option<Uuid>,
    pub status: IncidentStatus,
    pub attended_by: Option<Uuid>,
    pub attended_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub student_id: Uuid,
    pub request_date: NaiveDate,
    pub permission_types: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: PermissionStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub id: Uuid,
    pub student_id: Uuid,
    pub evaluation_date: NaiveDate,
    pub category: String,
    pub level: RiskLevel,
    pub notes: String,
}

/// Special-education needs (NEE) evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeeRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub evaluation_date: NaiveDate,
    pub diagnosis: String,
    pub support_needs: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dropout {
    pub id: Uuid,
    pub student_id: Uuid,
    pub dropout_date: NaiveDate,
    pub reason: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub student_id: Uuid,
    pub student_name: String,
    pub grade: String,
    pub section: String,
    pub total_count: usize,
    pub notable_count: usize,
    pub latest: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub value: String,
    pub count: usize,
}

/// Everything the engine reads, captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub grades: Vec<Grade>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub staff: Vec<StaffProfile>,
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub nee_records: Vec<NeeRecord>,
    #[serde(default)]
    pub dropouts: Vec<Dropout>,
}

impl Snapshot {
    pub fn staff_profile(&self, staff_id: Uuid) -> Option<&StaffProfile> {
        self.staff.iter().find(|profile| profile.id == staff_id)
    }
}
