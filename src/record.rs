use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Dropout, Incident, NeeRecord, Permission, RiskFactor};

/// A record owned by one student and stamped with a calendar date.
pub trait StudentRecord {
    fn id(&self) -> Uuid;
    fn student_id(&self) -> Uuid;
    fn recorded_on(&self) -> NaiveDate;
}

/// Categorical value(s) a record carries on one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tags<'a> {
    One(&'a str),
    Many(&'a [String]),
}

impl<'a> Tags<'a> {
    pub fn values(self) -> Vec<&'a str> {
        match self {
            Tags::One(value) => vec![value],
            Tags::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(self, needle: &str) -> bool {
        match self {
            Tags::One(value) => value == needle,
            Tags::Many(values) => values.iter().any(|value| value == needle),
        }
    }
}

impl StudentRecord for Incident {
    fn id(&self) -> Uuid {
        self.id
    }

    fn student_id(&self) -> Uuid {
        self.student_id
    }

    fn recorded_on(&self) -> NaiveDate {
        self.incident_date
    }
}

impl StudentRecord for Permission {
    fn id(&self) -> Uuid {
        self.id
    }

    fn student_id(&self) -> Uuid {
        self.student_id
    }

    fn recorded_on(&self) -> NaiveDate {
        self.request_date
    }
}

impl StudentRecord for RiskFactor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn student_id(&self) -> Uuid {
        self.student_id
    }

    fn recorded_on(&self) -> NaiveDate {
        self.evaluation_date
    }
}

impl StudentRecord for NeeRecord {
    fn id(&self) -> Uuid {
        self.id
    }

    fn student_id(&self) -> Uuid {
        self.student_id
    }

    fn recorded_on(&self) -> NaiveDate {
        self.evaluation_date
    }
}

impl StudentRecord for Dropout {
    fn id(&self) -> Uuid {
        self.id
    }

    fn student_id(&self) -> Uuid {
        self.student_id
    }

    fn recorded_on(&self) -> NaiveDate {
        self.dropout_date
    }
}
