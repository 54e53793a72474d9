use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::directory::NormalizedRecord;
use crate::models::StudentSummary;
use crate::record::{StudentRecord, Tags};

/// What counts towards a student's notable (urgent) count.
pub enum Notable<R> {
    /// Records satisfying the predicate, e.g. pending status or high level.
    Matching(fn(&R) -> bool),
    /// Distinct values seen across the student's records.
    DistinctTags(fn(&R) -> Tags<'_>),
}

struct Group<'a> {
    summary: StudentSummary,
    distinct: HashSet<&'a str>,
}

/// Groups records by student, most urgent students first.
///
/// Order: notable count desc, total count desc, display name
/// (case-insensitive), then first appearance in `records`.
pub fn summarize<'a, R: StudentRecord>(
    records: &[NormalizedRecord<'a, R>],
    notable: &Notable<R>,
) -> Vec<StudentSummary> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<Group<'a>> = Vec::new();

    for normalized in records {
        let record: &'a R = normalized.record;
        let slot = *index.entry(record.student_id()).or_insert_with(|| {
            groups.push(Group {
                summary: StudentSummary {
                    student_id: record.student_id(),
                    student_name: normalized.student.name.clone(),
                    grade: normalized.student.grade.clone(),
                    section: normalized.student.section.clone(),
                    total_count: 0,
                    notable_count: 0,
                    latest: record.recorded_on(),
                },
                distinct: HashSet::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.summary.total_count += 1;
        group.summary.latest = group.summary.latest.max(record.recorded_on());

        match notable {
            Notable::Matching(predicate) => {
                if predicate(record) {
                    group.summary.notable_count += 1;
                }
            }
            Notable::DistinctTags(accessor) => {
                group.distinct.extend(accessor(record).values());
                group.summary.notable_count = group.distinct.len();
            }
        }
    }

    let mut summaries: Vec<StudentSummary> =
        groups.into_iter().map(|group| group.summary).collect();
    summaries.sort_by(rank);
    summaries
}

fn rank(a: &StudentSummary, b: &StudentSummary) -> Ordering {
    b.notable_count
        .cmp(&a.notable_count)
        .then_with(|| b.total_count.cmp(&a.total_count))
        .then_with(|| {
            a.student_name
                .to_lowercase()
                .cmp(&b.student_name.to_lowercase())
        })
}
