//! Immutable snapshot handle.
//!
//! Every mutation produces a fresh [`Snapshot`] behind a new `Arc`;
//! snapshots already handed to callers never change underneath them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Dropout, Incident, NeeRecord, Permission, RiskFactor, Snapshot, Student};
use crate::status::{Decision, IncidentStatus, PermissionStatus, TransitionError};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UpsertStudent(Student),
    RemoveStudent(Uuid),
    UpsertIncident(Incident),
    UpsertPermission(Permission),
    UpsertRiskFactor(RiskFactor),
    UpsertNeeRecord(NeeRecord),
    UpsertDropout(Dropout),
    RemoveRecord(Uuid),
    AttendIncident {
        incident_id: Uuid,
        staff_id: Uuid,
        at: DateTime<Utc>,
        notes: Option<String>,
    },
    DecidePermission {
        permission_id: Uuid,
        decision: Decision,
        staff_id: Uuid,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no incident with id {0}")]
    IncidentNotFound(Uuid),
    #[error("no permission with id {0}")]
    PermissionNotFound(Uuid),
    #[error("incident {id} is {current}; use attend to change its status, not {requested}")]
    IncidentStatusOverwrite {
        id: Uuid,
        current: IncidentStatus,
        requested: IncidentStatus,
    },
    #[error("permission {id} is {current}; use decide to change its status, not {requested}")]
    PermissionStatusOverwrite {
        id: Uuid,
        current: PermissionStatus,
        requested: PermissionStatus,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Arc<Snapshot>,
}

fn upsert<T>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> Uuid) {
    let id = id_of(&item);
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: Arc::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    pub fn apply(&mut self, mutation: Mutation) -> Result<Arc<Snapshot>, StoreError> {
        let mut next = (*self.current).clone();

        match mutation {
            Mutation::UpsertStudent(student) => upsert(&mut next.students, student, |s| s.id),
            Mutation::RemoveStudent(student_id) => {
                next.students.retain(|student| student.id != student_id);
            }
            Mutation::UpsertIncident(incident) => {
                // Status moves only through AttendIncident.
                if let Some(existing) = next.incidents.iter().find(|i| i.id == incident.id) {
                    if existing.status != incident.status {
                        return Err(StoreError::IncidentStatusOverwrite {
                            id: incident.id,
                            current: existing.status,
                            requested: incident.status,
                        });
                    }
                }
                upsert(&mut next.incidents, incident, |i| i.id)
            }
            Mutation::UpsertPermission(permission) => {
                // Status moves only through DecidePermission.
                if let Some(existing) = next.permissions.iter().find(|p| p.id == permission.id) {
                    if existing.status != permission.status {
                        return Err(StoreError::PermissionStatusOverwrite {
                            id: permission.id,
                            current: existing.status,
                            requested: permission.status,
                        });
                    }
                }
                upsert(&mut next.permissions, permission, |p| p.id)
            }
            Mutation::UpsertRiskFactor(risk) => upsert(&mut next.risk_factors, risk, |r| r.id),
            Mutation::UpsertNeeRecord(record) => upsert(&mut next.nee_records, record, |r| r.id),
            Mutation::UpsertDropout(dropout) => upsert(&mut next.dropouts, dropout, |d| d.id),
            Mutation::RemoveRecord(record_id) => {
                next.incidents.retain(|record| record.id != record_id);
                next.permissions.retain(|record| record.id != record_id);
                next.risk_factors.retain(|record| record.id != record_id);
                next.nee_records.retain(|record| record.id != record_id);
                next.dropouts.retain(|record| record.id != record_id);
            }
            Mutation::AttendIncident {
                incident_id,
                staff_id,
                at,
                notes,
            } => {
                let incident = next
                    .incidents
                    .iter_mut()
                    .find(|incident| incident.id == incident_id)
                    .ok_or(StoreError::IncidentNotFound(incident_id))?;
                *incident = incident.attend(staff_id, at, notes)?;
            }
            Mutation::DecidePermission {
                permission_id,
                decision,
                staff_id,
                at,
            } => {
                let permission = next
                    .permissions
                    .iter_mut()
                    .find(|permission| permission.id == permission_id)
                    .ok_or(StoreError::PermissionNotFound(permission_id))?;
                *permission = permission.decide(decision, staff_id, at)?;
            }
        }

        debug!(
            students = next.students.len(),
            incidents = next.incidents.len(),
            permissions = next.permissions.len(),
            "applied snapshot mutation"
        );
        self.current = Arc::new(next);
        Ok(self.snapshot())
    }
}
