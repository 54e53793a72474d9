use std::collections::{BTreeMap, HashSet};

use crate::directory::NormalizedRecord;
use crate::models::TagCount;
use crate::record::Tags;

/// Distinct values of one categorical field with occurrence counts,
/// sorted alphabetically so filter menus keep a stable order.
///
/// A value repeated inside one record's tag set counts once for that record.
pub fn frequency_index<R>(
    records: &[NormalizedRecord<'_, R>],
    accessor: fn(&R) -> Tags<'_>,
) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for normalized in records {
        let mut seen = HashSet::new();
        for value in accessor(normalized.record).values() {
            if seen.insert(value) {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|(value, count)| TagCount {
            value: value.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StudentView;
    use crate::models::Incident;
    use crate::status::IncidentStatus;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn incident(types: &[&str]) -> Incident {
        Incident {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            incident_date: NaiveDate::from_ymd_opt(2025, 8, 18).unwrap(),
            incident_types: types.iter().map(|value| value.to_string()).collect(),
            description: String::new(),
            reported_by: None,
            status: IncidentStatus::Pending,
            attended_by: None,
            attended_at: None,
            resolution_notes: None,
        }
    }

    fn types(incident: &Incident) -> Tags<'_> {
        Tags::Many(&incident.incident_types)
    }

    fn normalized(record: &Incident) -> NormalizedRecord<'_, Incident> {
        NormalizedRecord {
            record,
            student: StudentView {
                student_id: record.student_id,
                name: "Rosa Huamán".to_string(),
                document_id: None,
                grade: "-".to_string(),
                section: "-".to_string(),
                grade_id: None,
                section_id: None,
            },
        }
    }

    #[test]
    fn counts_are_sorted_by_value_not_count() {
        let incidents = vec![
            incident(&["Vandalism"]),
            incident(&["Vandalism", "Bullying"]),
            incident(&["Vandalism"]),
        ];
        let records: Vec<_> = incidents.iter().map(normalized).collect();

        let index = frequency_index(&records, types);

        assert_eq!(index[0].value, "Bullying");
        assert_eq!(index[0].count, 1);
        assert_eq!(index[1].value, "Vandalism");
        assert_eq!(index[1].count, 3);
    }

    #[test]
    fn empty_records_give_empty_index() {
        let records: Vec<NormalizedRecord<'_, Incident>> = Vec::new();
        assert!(frequency_index(&records, types).is_empty());
    }
}
