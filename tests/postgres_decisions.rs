//! Runs against a disposable Postgres:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use school_records_triage::db;
use school_records_triage::models::Permission;
use school_records_triage::status::{Decision, PermissionStatus};

async fn pool() -> anyhow::Result<PgPool> {
    let url = std::env::var("DATABASE_URL")?;
    let pool = db::connect(&url, 2).await?;
    db::init_db(&pool).await?;
    Ok(pool)
}

async fn insert_pending(pool: &PgPool) -> anyhow::Result<Permission> {
    let day = NaiveDate::from_ymd_opt(2025, 10, 6).expect("valid day");
    let permission = Permission {
        id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        request_date: day,
        permission_types: vec!["Medical".to_string()],
        start_date: day,
        end_date: day,
        reason: "Dentist appointment".to_string(),
        status: PermissionStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
    };
    sqlx::query(
        "INSERT INTO school_records.permissions \
         (id, student_id, request_date, permission_types, start_date, end_date, reason) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(permission.id)
    .bind(permission.student_id)
    .bind(permission.request_date)
    .bind(&permission.permission_types)
    .bind(permission.start_date)
    .bind(permission.end_date)
    .bind(&permission.reason)
    .execute(pool)
    .await?;
    Ok(permission)
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn second_decision_from_a_stale_snapshot_is_refused() -> anyhow::Result<()> {
    let pool = pool().await?;
    let pending = insert_pending(&pool).await?;

    // Both callers loaded the permission while it was still pending.
    let approved = pending.decide(Decision::Approve, Uuid::new_v4(), Utc::now())?;
    let rejected = pending.decide(Decision::Reject, Uuid::new_v4(), Utc::now())?;

    db::save_decision(&pool, &approved).await?;
    let err = db::save_decision(&pool, &rejected).await.unwrap_err();
    assert!(err.to_string().contains("no longer pending"));

    let status: String = sqlx::query("SELECT status FROM school_records.permissions WHERE id = $1")
        .bind(pending.id)
        .fetch_one(&pool)
        .await?
        .get("status");
    assert_eq!(status, "Approved");
    Ok(())
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn seeding_twice_does_not_duplicate_records() -> anyhow::Result<()> {
    let pool = pool().await?;
    db::seed(&pool).await?;
    let first = db::fetch_snapshot(&pool).await?;

    db::seed(&pool).await?;
    let second = db::fetch_snapshot(&pool).await?;

    assert_eq!(first.incidents.len(), second.incidents.len());
    assert_eq!(first.permissions.len(), second.permissions.len());
    assert_eq!(first.risk_factors.len(), second.risk_factors.len());
    assert_eq!(first.nee_records.len(), second.nee_records.len());
    assert_eq!(first.dropouts.len(), second.dropouts.len());
    Ok(())
}
