//! Status lifecycles for incidents and permissions.
//!
//! Incidents move `Pending -> Attended`; permissions move
//! `Pending -> Approved | Rejected`. Every non-pending state is terminal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Incident, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Pending,
    Attended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Outcome chosen by a reviewer for a pending permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized {kind} value: {value:?}")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("incident {0} has already been attended")]
    AlreadyAttended(Uuid),
    #[error("permission {id} was already {status}")]
    AlreadyDecided { id: Uuid, status: PermissionStatus },
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Pending => "Pending",
            IncidentStatus::Attended => "Attended",
        }
    }
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Pending => "Pending",
            PermissionStatus::Approved => "Approved",
            PermissionStatus::Rejected => "Rejected",
        }
    }
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl FromStr for IncidentStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Pending" => Ok(IncidentStatus::Pending),
            "Attended" => Ok(IncidentStatus::Attended),
            other => Err(ParseStatusError {
                kind: "incident status",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for PermissionStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Pending" => Ok(PermissionStatus::Pending),
            "Approved" => Ok(PermissionStatus::Approved),
            "Rejected" => Ok(PermissionStatus::Rejected),
            other => Err(ParseStatusError {
                kind: "permission status",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(ParseStatusError {
                kind: "risk level",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Incident {
    /// Marks the incident as attended by `staff_id`. The original is left untouched.
    pub fn attend(
        &self,
        staff_id: Uuid,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Incident, TransitionError> {
        if self.status == IncidentStatus::Attended {
            return Err(TransitionError::AlreadyAttended(self.id));
        }

        Ok(Incident {
            status: IncidentStatus::Attended,
            attended_by: Some(staff_id),
            attended_at: Some(at),
            resolution_notes: notes.filter(|text| !text.trim().is_empty()),
            ..self.clone()
        })
    }
}

impl Permission {
    pub fn decide(
        &self,
        decision: Decision,
        staff_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Permission, TransitionError> {
        if self.status != PermissionStatus::Pending {
            return Err(TransitionError::AlreadyDecided {
                id: self.id,
                status: self.status,
            });
        }

        let status = match decision {
            Decision::Approve => PermissionStatus::Approved,
            Decision::Reject => PermissionStatus::Rejected,
        };

        Ok(Permission {
            status,
            reviewed_by: Some(staff_id),
            reviewed_at: Some(at),
            ..self.clone()
        })
    }
}
