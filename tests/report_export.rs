mod test_support;

use chrono::{TimeZone, Utc};

use school_records_triage::directory::StudentDirectory;
use school_records_triage::features;
use school_records_triage::filter::Query;
use school_records_triage::report::{build_report, write_csv};
use school_records_triage::scope::Viewer;
use school_records_triage::status::{IncidentStatus, PermissionStatus};
use test_support::{incident, permission, school};

#[test]
fn csv_header_round_trips_column_labels() {
    let mut fixture = school();
    fixture.snapshot.incidents = vec![
        incident(fixture.ana, 1, &["Bullying", "Vandalism"], IncidentStatus::Pending),
        incident(fixture.luis, 2, &["Tardiness"], IncidentStatus::Attended),
    ];
    let snapshot = &fixture.snapshot;
    let directory = StudentDirectory::from_snapshot(snapshot);
    let feature = features::incidents();
    let viewer = Viewer::unrestricted(fixture.director);
    let visible = feature.view(&snapshot.incidents, &directory, &viewer, &snapshot.assignments, &Query::new());

    let table = feature.table(&visible);
    let mut buffer = Vec::new();
    write_csv(&table, &mut buffer).unwrap();

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    let expected: Vec<String> = feature.columns.iter().map(|column| column.label.to_string()).collect();
    assert_eq!(header, expected);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.len() == expected.len()));
    // Newest first: Luis (day 2) before Ana (day 1).
    assert_eq!(&rows[0][1], "Luis Quispe");
    assert_eq!(&rows[1][5], "Bullying, Vandalism");
}

#[test]
fn projected_dates_use_calendar_days() {
    let mut fixture = school();
    let mut decided = permission(fixture.ana, 9, &["Medical"], PermissionStatus::Approved);
    decided.reviewed_at = Some(Utc.with_ymd_and_hms(2025, 9, 9, 23, 50, 0).unwrap());
    fixture.snapshot.permissions = vec![decided];
    let snapshot = &fixture.snapshot;
    let directory = StudentDirectory::from_snapshot(snapshot);
    let feature = features::permissions();
    let viewer = Viewer::unrestricted(fixture.director);
    let visible = feature.view(&snapshot.permissions, &directory, &viewer, &snapshot.assignments, &Query::new());

    let table = feature.table(&visible);
    let row = &table.rows[0];
    let column = |label: &str| {
        table
            .header
            .iter()
            .position(|header| header == label)
            .expect("column present")
    };

    assert_eq!(row[column("Requested on")], "09/09/2025");
    assert_eq!(row[column("To")], "10/09/2025");
    assert_eq!(row[column("Reviewed on")], "09/09/2025");
    assert_eq!(row[column("Grade")], "1st");
    assert_eq!(row[column("Section")], "A");
}

#[test]
fn markdown_report_lists_students_and_options() {
    let mut fixture = school();
    fixture.snapshot.incidents = vec![
        incident(fixture.ana, 1, &["Bullying"], IncidentStatus::Pending),
        incident(fixture.ana, 2, &["Bullying"], IncidentStatus::Pending),
    ];
    let snapshot = &fixture.snapshot;
    let directory = StudentDirectory::from_snapshot(snapshot);
    let feature = features::incidents();
    let viewer = Viewer::unrestricted(fixture.director);
    let visible = feature.view(&snapshot.incidents, &directory, &viewer, &snapshot.assignments, &Query::new());

    let markdown = build_report(&feature, "Carmen Rojas (Director)", &visible, 10);

    assert!(markdown.starts_with("# Incidents report"));
    assert!(markdown.contains("- Bullying: 2"));
    assert!(markdown.contains("- Ana López (1st A) 2 pending of 2 records, latest 02/09/2025"));
    assert!(markdown.contains("| Date | Student |"));
}

#[test]
fn empty_view_still_renders() {
    let fixture = school();
    let snapshot = &fixture.snapshot;
    let directory = StudentDirectory::from_snapshot(snapshot);
    let feature = features::dropouts();
    let viewer = Viewer::unrestricted(fixture.director);
    let visible = feature.view(&snapshot.dropouts, &directory, &viewer, &snapshot.assignments, &Query::new());

    let markdown = build_report(&feature, "all sections", &visible, 10);

    assert!(markdown.contains("No students with records in this view."));
    assert!(markdown.contains("No records in this view."));
}
