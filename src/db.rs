use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Assignment, Dropout, Grade, Incident, NeeRecord, Permission, RiskFactor, Section, Snapshot,
    StaffProfile, StaffRole, Student,
};

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub fn read_snapshot_file(path: &Path) -> anyhow::Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid snapshot JSON in {}", path.display()))
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let first_grade = Uuid::parse_str("6b1f6c0e-2f53-4d6f-9a53-0c2e3f1a8e01")?;
    let second_grade = Uuid::parse_str("6b1f6c0e-2f53-4d6f-9a53-0c2e3f1a8e02")?;
    let sections = vec![
        (Uuid::parse_str("a4f0d3a1-51c2-4b8f-8f7e-3d1c2b0a9f11")?, first_grade, "A"),
        (Uuid::parse_str("a4f0d3a1-51c2-4b8f-8f7e-3d1c2b0a9f12")?, first_grade, "B"),
        (Uuid::parse_str("a4f0d3a1-51c2-4b8f-8f7e-3d1c2b0a9f21")?, second_grade, "A"),
    ];

    for (id, name, position) in [(first_grade, "1st", 1), (second_grade, "2nd", 2)] {
        sqlx::query(
            r#"
            INSERT INTO school_records.grades (id, name, position)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, position = EXCLUDED.position
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(position)
        .execute(pool)
        .await?;
    }

    for (id, grade_id, name) in &sections {
        sqlx::query(
            r#"
            INSERT INTO school_records.sections (id, grade_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(id)
        .bind(grade_id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let students = vec![
        ("Ana", "López", "70112233", 0),
        ("Luis", "Quispe", "70445566", 0),
        ("Rosa", "Huamán", "71889900", 1),
        ("Diego", "Torres", "72001122", 2),
    ];
    let mut student_ids = HashMap::new();

    for (first_name, last_name, document_id, section) in students {
        let (section_id, grade_id, _) = sections[section];
        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO school_records.students
            (id, first_name, last_name, document_id, grade_id, section_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (document_id) DO UPDATE
            SET first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(first_name)
        .bind(last_name)
        .bind(document_id)
        .bind(grade_id)
        .bind(section_id)
        .fetch_one(pool)
        .await?
        .get("id");
        student_ids.insert(document_id, student_id);
    }

    let staff = vec![
        (
            Uuid::parse_str("c9e1b7a2-0d4f-4c3e-9b8a-7f6e5d4c3b21")?,
            "Carmen Rojas",
            "carmen.rojas@school.edu.pe",
            StaffRole::Director,
            None,
        ),
        (
            Uuid::parse_str("c9e1b7a2-0d4f-4c3e-9b8a-7f6e5d4c3b22")?,
            "Jorge Salazar",
            "jorge.salazar@school.edu.pe",
            StaffRole::Docente,
            Some("40556677"),
        ),
    ];

    for (id, name, email, role, document_id) in &staff {
        sqlx::query(
            r#"
            INSERT INTO school_records.staff_profiles (id, name, email, role, document_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name, role = EXCLUDED.role, document_id = EXCLUDED.document_id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role.as_str())
        .bind(document_id)
        .execute(pool)
        .await?;
    }

    let (teacher_id, _, _, _, _) = staff[1];
    let (section_id, grade_id, _) = sections[0];
    sqlx::query(
        r#"
        INSERT INTO school_records.assignments (staff_id, grade_id, section_id)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(teacher_id)
    .bind(grade_id)
    .bind(section_id)
    .execute(pool)
    .await?;

    let incidents = vec![
        ("seed-inc-001", "70112233", date(2025, 9, 8)?, "Bullying;Verbal aggression", "Insulted a classmate during recess"),
        ("seed-inc-002", "70112233", date(2025, 9, 15)?, "Tardiness", "Arrived 40 minutes late"),
        ("seed-inc-003", "71889900", date(2025, 9, 10)?, "Vandalism", "Damaged a desk in classroom 1B"),
        ("seed-inc-004", "72001122", date(2025, 9, 12)?, "Bullying;Vandalism", "Broke a classmate's notebook"),
    ];

    for (source_key, document_id, incident_date, types, description) in incidents {
        let Some(student_id) = student_ids.get(document_id) else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO school_records.incidents
            (id, student_id, incident_date, incident_types, description, status, source_key)
            VALUES ($1, $2, $3, $4, $5, 'Pending', $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(incident_date)
        .bind(split_tags(types))
        .bind(description)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let permission_day = date(2025, 9, 18)?;
    if let Some(student_id) = student_ids.get("70445566") {
        sqlx::query(
            r#"
            INSERT INTO school_records.permissions
            (id, student_id, request_date, permission_types, start_date, end_date, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'Pending')
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str("e2d4c6b8-1a3f-4e5d-8c7b-6a5f4e3d2c11")?)
        .bind(student_id)
        .bind(permission_day)
        .bind(vec!["Medical".to_string()])
        .bind(permission_day)
        .bind(permission_day)
        .bind("Dentist appointment")
        .execute(pool)
        .await?;
    }

    let risks = vec![
        ("f3a5b7c9-2d4e-4f60-9a1b-3c5d7e9f0a21", "70112233", "Family", "High", "Parents separated this term"),
        ("f3a5b7c9-2d4e-4f60-9a1b-3c5d7e9f0a22", "70112233", "Academic", "Medium", "Failing mathematics"),
        ("f3a5b7c9-2d4e-4f60-9a1b-3c5d7e9f0a23", "71889900", "Economic", "Low", "Occasional absences to work"),
    ];
    for (id, document_id, category, level, notes) in risks {
        let Some(student_id) = student_ids.get(document_id) else {
            continue;
        };
        sqlx::query(
            r#"
            INSERT INTO school_records.risk_factors
            (id, student_id, evaluation_date, category, level, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(student_id)
        .bind(date(2025, 8, 29)?)
        .bind(category)
        .bind(level)
        .bind(notes)
        .execute(pool)
        .await?;
    }

    if let Some(student_id) = student_ids.get("70445566") {
        sqlx::query(
            r#"
            INSERT INTO school_records.nee_records
            (id, student_id, evaluation_date, diagnosis, support_needs, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str("0b2d4f61-8a9c-4b3e-a5d7-c9e1f3a5b731")?)
        .bind(student_id)
        .bind(date(2025, 4, 2)?)
        .bind("Dyslexia")
        .bind("Extra time on written exams")
        .bind("Reviewed by the school psychologist")
        .execute(pool)
        .await?;
    }

    if let Some(student_id) = student_ids.get("72001122") {
        sqlx::query(
            r#"
            INSERT INTO school_records.dropouts (id, student_id, dropout_date, reason, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str("1c3e5a72-9b0d-4c4f-b6e8-d0f2a4b6c841")?)
        .bind(student_id)
        .bind(date(2025, 10, 1)?)
        .bind("Family relocation")
        .bind("Moved to another region")
        .execute(pool)
        .await?;
    }

    info!(students = student_ids.len(), "seed data inserted");
    Ok(())
}

fn student_from_row(row: &PgRow) -> Student {
    Student {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        document_id: row.get("document_id"),
        grade_id: row.get("grade_id"),
        section_id: row.get("section_id"),
    }
}

fn incident_from_row(row: &PgRow) -> anyhow::Result<Incident> {
    Ok(Incident {
        id: row.get("id"),
        student_id: row.get("student_id"),
        incident_date: row.get("incident_date"),
        incident_types: row.get("incident_types"),
        description: row.get("description"),
        reported_by: row.get("reported_by"),
        status: row.get::<String, _>("status").parse()?,
        attended_by: row.get("attended_by"),
        attended_at: row.get("attended_at"),
        resolution_notes: row.get("resolution_notes"),
    })
}

fn permission_from_row(row: &PgRow) -> anyhow::Result<Permission> {
    Ok(Permission {
        id: row.get("id"),
        student_id: row.get("student_id"),
        request_date: row.get("request_date"),
        permission_types: row.get("permission_types"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        reason: row.get("reason"),
        status: row.get::<String, _>("status").parse()?,
        reviewed_by: row.get("reviewed_by"),
        reviewed_at: row.get("reviewed_at"),
    })
}

fn risk_from_row(row: &PgRow) -> anyhow::Result<RiskFactor> {
    Ok(RiskFactor {
        id: row.get("id"),
        student_id: row.get("student_id"),
        evaluation_date: row.get("evaluation_date"),
        category: row.get("category"),
        level: row.get::<String, _>("level").parse()?,
        notes: row.get("notes"),
    })
}

/// Loads everything the engine needs in one pass.
pub async fn fetch_snapshot(pool: &PgPool) -> anyhow::Result<Snapshot> {
    let grade_rows = sqlx::query("SELECT id, name FROM school_records.grades ORDER BY position, name")
        .fetch_all(pool)
        .await?;
    let section_rows =
        sqlx::query("SELECT id, grade_id, name FROM school_records.sections ORDER BY name")
            .fetch_all(pool)
            .await?;

    let mut grades: Vec<Grade> = grade_rows
        .iter()
        .map(|row| Grade {
            id: row.get("id"),
            name: row.get("name"),
            sections: Vec::new(),
        })
        .collect();
    for row in section_rows {
        let section = Section {
            id: row.get("id"),
            grade_id: row.get("grade_id"),
            name: row.get("name"),
        };
        if let Some(grade) = grades.iter_mut().find(|grade| grade.id == section.grade_id) {
            grade.sections.push(section);
        }
    }

    let students = sqlx::query(
        "SELECT id, first_name, last_name, document_id, grade_id, section_id \
         FROM school_records.students ORDER BY last_name, first_name",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(student_from_row)
    .collect();

    let assignments = sqlx::query("SELECT staff_id, grade_id, section_id FROM school_records.assignments")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| Assignment {
            staff_id: row.get("staff_id"),
            grade_id: row.get("grade_id"),
            section_id: row.get("section_id"),
        })
        .collect();

    let mut staff = Vec::new();
    for row in sqlx::query("SELECT id, name, email, role, document_id FROM school_records.staff_profiles")
        .fetch_all(pool)
        .await?
    {
        let role: String = row.get("role");
        let Some(role) = StaffRole::parse(&role) else {
            warn!(role = %role, "skipping staff profile with unknown role");
            continue;
        };
        staff.push(StaffProfile {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            role,
            document_id: row.get("document_id"),
        });
    }

    let incidents = sqlx::query(
        "SELECT id, student_id, incident_date, incident_types, description, reported_by, \
         status, attended_by, attended_at, resolution_notes FROM school_records.incidents",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(incident_from_row)
    .collect::<anyhow::Result<Vec<_>>>()?;

    let permissions = sqlx::query(
        "SELECT id, student_id, request_date, permission_types, start_date, end_date, reason, \
         status, reviewed_by, reviewed_at FROM school_records.permissions",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(permission_from_row)
    .collect::<anyhow::Result<Vec<_>>>()?;

    let risk_factors = sqlx::query(
        "SELECT id, student_id, evaluation_date, category, level, notes \
         FROM school_records.risk_factors",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(risk_from_row)
    .collect::<anyhow::Result<Vec<_>>>()?;

    let nee_records = sqlx::query(
        "SELECT id, student_id, evaluation_date, diagnosis, support_needs, notes \
         FROM school_records.nee_records",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| NeeRecord {
        id: row.get("id"),
        student_id: row.get("student_id"),
        evaluation_date: row.get("evaluation_date"),
        diagnosis: row.get("diagnosis"),
        support_needs: row.get("support_needs"),
        notes: row.get("notes"),
    })
    .collect();

    let dropouts = sqlx::query(
        "SELECT id, student_id, dropout_date, reason, notes FROM school_records.dropouts",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| Dropout {
        id: row.get("id"),
        student_id: row.get("student_id"),
        dropout_date: row.get("dropout_date"),
        reason: row.get("reason"),
        notes: row.get("notes"),
    })
    .collect();

    Ok(Snapshot {
        students,
        grades,
        assignments,
        staff,
        incidents,
        permissions,
        risk_factors,
        nee_records,
        dropouts,
    })
}

fn ensure_was_pending(rows_affected: u64, kind: &str, id: Uuid) -> anyhow::Result<()> {
    if rows_affected == 0 {
        bail!("{kind} {id} is no longer pending; another decision was saved first");
    }
    Ok(())
}

/// Writes an attended incident, but only over a row that is still pending.
pub async fn save_attendance(pool: &PgPool, incident: &Incident) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE school_records.incidents
        SET status = $2, attended_by = $3, attended_at = $4, resolution_notes = $5
        WHERE id = $1 AND status = 'Pending'
        "#,
    )
    .bind(incident.id)
    .bind(incident.status.as_str())
    .bind(incident.attended_by)
    .bind(incident.attended_at)
    .bind(&incident.resolution_notes)
    .execute(pool)
    .await
    .with_context(|| format!("failed to save incident {}", incident.id))?;

    ensure_was_pending(result.rows_affected(), "incident", incident.id)
}

/// Writes a decided permission, but only over a row that is still pending.
pub async fn save_decision(pool: &PgPool, permission: &Permission) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE school_records.permissions
        SET status = $2, reviewed_by = $3, reviewed_at = $4
        WHERE id = $1 AND status = 'Pending'
        "#,
    )
    .bind(permission.id)
    .bind(permission.status.as_str())
    .bind(permission.reviewed_by)
    .bind(permission.reviewed_at)
    .execute(pool)
    .await
    .with_context(|| format!("failed to save permission {}", permission.id))?;

    ensure_was_pending(result.rows_affected(), "permission", permission.id)
}

pub async fn import_students_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        first_name: String,
        last_name: String,
        document_id: String,
        grade: Option<String>,
        section: Option<String>,
    }

    let placement: HashMap<(String, String), (Uuid, Uuid)> = sqlx::query(
        "SELECT g.id AS grade_id, g.name AS grade_name, s.id AS section_id, s.name AS section_name \
         FROM school_records.sections s \
         JOIN school_records.grades g ON g.id = s.grade_id",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| {
        (
            (row.get("grade_name"), row.get("section_name")),
            (row.get("grade_id"), row.get("section_id")),
        )
    })
    .collect();

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut upserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let key = (
            row.grade.unwrap_or_default().trim().to_string(),
            row.section.unwrap_or_default().trim().to_string(),
        );
        let placed = placement.get(&key).copied();
        if placed.is_none() && !(key.0.is_empty() && key.1.is_empty()) {
            warn!(
                document_id = %row.document_id,
                grade = %key.0,
                section = %key.1,
                "unknown grade/section, importing student unplaced"
            );
        }

        sqlx::query(
            r#"
            INSERT INTO school_records.students
            (id, first_name, last_name, document_id, grade_id, section_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (document_id) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                grade_id = EXCLUDED.grade_id,
                section_id = EXCLUDED.section_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.first_name.trim())
        .bind(row.last_name.trim())
        .bind(row.document_id.trim())
        .bind(placed.map(|(grade_id, _)| grade_id))
        .bind(placed.map(|(_, section_id)| section_id))
        .execute(pool)
        .await?;
        upserted += 1;
    }

    Ok(upserted)
}

pub async fn import_incidents_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        document_id: String,
        incident_date: NaiveDate,
        incident_types: String,
        description: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let student_id: Option<Uuid> = sqlx::query(
            "SELECT id FROM school_records.students WHERE document_id = $1",
        )
        .bind(row.document_id.trim())
        .fetch_optional(pool)
        .await?
        .map(|found| found.get("id"));

        let Some(student_id) = student_id else {
            warn!(document_id = %row.document_id, "no student with this document, skipping incident");
            continue;
        };

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO school_records.incidents
            (id, student_id, incident_date, incident_types, description, status, source_key)
            VALUES ($1, $2, $3, $4, $5, 'Pending', $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(row.incident_date)
        .bind(split_tags(&row.incident_types))
        .bind(&row.description)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_split_on_semicolons() {
        assert_eq!(
            split_tags("Bullying; Vandalism;;"),
            vec!["Bullying".to_string(), "Vandalism".to_string()]
        );
        assert!(split_tags("  ").is_empty());
    }

    #[test]
    fn untouched_row_means_the_record_was_already_decided() {
        let id = Uuid::new_v4();

        let err = ensure_was_pending(0, "permission", id).unwrap_err();

        assert!(err.to_string().contains(&format!("permission {id} is no longer pending")));
        assert!(ensure_was_pending(1, "permission", id).is_ok());
    }

    #[test]
    fn snapshot_file_round_trips_through_json() {
        let path = std::env::temp_dir().join(format!("snapshot-{}.json", Uuid::new_v4()));
        let snapshot = Snapshot {
            students: vec![Student {
                id: Uuid::new_v4(),
                first_name: "Ana".to_string(),
                last_name: "López".to_string(),
                document_id: "70112233".to_string(),
                grade_id: None,
                section_id: None,
            }],
            ..Snapshot::default()
        };
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let loaded = read_snapshot_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, snapshot);
    }
}
