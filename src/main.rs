use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use uuid::Uuid;

use school_records_triage::config::{AppConfig, RecordSource, DEFAULT_MAX_CONNECTIONS};
use school_records_triage::db;
use school_records_triage::directory::StudentDirectory;
use school_records_triage::export::format_date;
use school_records_triage::features::{self, Feature};
use school_records_triage::filter::Query;
use school_records_triage::models::{Incident, Permission, Snapshot};
use school_records_triage::record::StudentRecord;
use school_records_triage::report;
use school_records_triage::scope::Viewer;
use school_records_triage::status::Decision;
use school_records_triage::store::{Mutation, SnapshotStore};

#[derive(Parser)]
#[command(name = "school-records-triage")]
#[command(about = "Student record summaries, filters and exports for school staff", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
    /// Read records from a JSON snapshot instead of Postgres
    #[arg(long, global = true, env = "SNAPSHOT_PATH")]
    snapshot: Option<PathBuf>,
    #[arg(long, global = true, env = "DB_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeatureKind {
    Incidents,
    Permissions,
    RiskFactors,
    Nee,
    Dropouts,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportKind {
    Students,
    Incidents,
}

#[derive(Args)]
struct ViewArgs {
    #[arg(value_enum)]
    feature: FeatureKind,
    /// Staff member whose assignments limit the view (all sections when omitted)
    #[arg(long)]
    staff_id: Option<Uuid>,
    /// Case-insensitive match on the student name
    #[arg(long, default_value = "")]
    search: String,
    /// Categorical filter as key=value, repeatable (e.g. --filter type=Bullying)
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import students or incidents from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: ImportKind,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank students by urgent records
    Summary {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List filter values with their counts (--filter is rejected; menus ignore selections)
    Options {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Export the filtered records as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "records.csv")]
        out: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Mark a pending incident as attended
    Attend {
        incident_id: Uuid,
        #[arg(long)]
        staff_id: Uuid,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Approve or reject a pending permission
    #[command(group(
        ArgGroup::new("decision")
            .args(["approve", "reject"])
            .required(true)
            .multiple(false)
    ))]
    Decide {
        permission_id: Uuid,
        #[arg(long)]
        staff_id: Uuid,
        #[arg(long)]
        approve: bool,
        #[arg(long)]
        reject: bool,
    },
}

enum ViewAction {
    Summary { limit: usize },
    Options,
    Export { out: PathBuf },
    Report { out: PathBuf, limit: usize },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.database_url, cli.snapshot, cli.max_connections)?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { kind, csv } => {
            let pool = connect(&config).await?;
            let (count, label) = match kind {
                ImportKind::Students => (db::import_students_csv(&pool, &csv).await?, "students"),
                ImportKind::Incidents => (db::import_incidents_csv(&pool, &csv).await?, "incidents"),
            };
            println!("Imported {count} {label} from {}.", csv.display());
        }
        Commands::Summary { view, limit } => {
            let snapshot = load_snapshot(&config).await?;
            run_view(&snapshot, view, ViewAction::Summary { limit })?;
        }
        Commands::Options { view } => {
            let snapshot = load_snapshot(&config).await?;
            run_view(&snapshot, view, ViewAction::Options)?;
        }
        Commands::Export { view, out } => {
            let snapshot = load_snapshot(&config).await?;
            run_view(&snapshot, view, ViewAction::Export { out })?;
        }
        Commands::Report { view, out, limit } => {
            let snapshot = load_snapshot(&config).await?;
            run_view(&snapshot, view, ViewAction::Report { out, limit })?;
        }
        Commands::Attend {
            incident_id,
            staff_id,
            notes,
        } => {
            let pool = connect(&config).await?;
            let mut store = SnapshotStore::new(db::fetch_snapshot(&pool).await?);
            ensure_staff(&store.snapshot(), staff_id)?;

            let snapshot = store.apply(Mutation::AttendIncident {
                incident_id,
                staff_id,
                at: Utc::now(),
                notes,
            })?;
            let incident: &Incident = snapshot
                .incidents
                .iter()
                .find(|incident| incident.id == incident_id)
                .context("attended incident missing from snapshot")?;
            db::save_attendance(&pool, incident).await?;
            info!(%incident_id, %staff_id, "incident attended");
            println!("Incident {incident_id} marked as attended.");
        }
        Commands::Decide {
            permission_id,
            staff_id,
            approve,
            reject: _,
        } => {
            let decision = if approve {
                Decision::Approve
            } else {
                Decision::Reject
            };
            let pool = connect(&config).await?;
            let mut store = SnapshotStore::new(db::fetch_snapshot(&pool).await?);
            ensure_staff(&store.snapshot(), staff_id)?;

            let snapshot = store.apply(Mutation::DecidePermission {
                permission_id,
                decision,
                staff_id,
                at: Utc::now(),
            })?;
            let permission: &Permission = snapshot
                .permissions
                .iter()
                .find(|permission| permission.id == permission_id)
                .context("decided permission missing from snapshot")?;
            db::save_decision(&pool, permission).await?;
            info!(%permission_id, %staff_id, status = %permission.status, "permission decided");
            println!("Permission {permission_id} is now {}.", permission.status);
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let (database_url, max_connections) = config.database_url()?;
    db::connect(database_url, max_connections).await
}

async fn load_snapshot(config: &AppConfig) -> anyhow::Result<Snapshot> {
    let snapshot = match &config.source {
        RecordSource::File(path) => db::read_snapshot_file(path)?,
        RecordSource::Postgres { .. } => {
            let pool = connect(config).await?;
            db::fetch_snapshot(&pool).await?
        }
    };
    info!(
        students = snapshot.students.len(),
        incidents = snapshot.incidents.len(),
        permissions = snapshot.permissions.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

fn ensure_staff(snapshot: &Snapshot, staff_id: Uuid) -> anyhow::Result<()> {
    if snapshot.staff_profile(staff_id).is_none() {
        bail!("no staff profile with id {staff_id}");
    }
    Ok(())
}

fn resolve_viewer(snapshot: &Snapshot, staff_id: Option<Uuid>) -> anyhow::Result<(Viewer, String)> {
    let Some(staff_id) = staff_id else {
        return Ok((Viewer::unrestricted(Uuid::nil()), "all sections".to_string()));
    };
    let profile = snapshot
        .staff_profile(staff_id)
        .with_context(|| format!("no staff profile with id {staff_id}"))?;
    let viewer = Viewer::new(profile.id, profile.role);
    if viewer.restricted && !snapshot.assignments.iter().any(|a| a.staff_id == staff_id) {
        warn!(%staff_id, role = profile.role.as_str(), "staff member has no section assignments");
    }
    Ok((viewer, format!("{} ({})", profile.name, profile.role.as_str())))
}

fn build_query<R>(feature: &Feature<R>, search: String, filters: &[String]) -> anyhow::Result<Query>
where
    R: StudentRecord,
{
    let mut query = Query::new().search(search);
    for raw in filters {
        let Some((key, value)) = raw.split_once('=') else {
            bail!("filter {raw:?} must look like key=value");
        };
        let key = key.trim();
        if feature.dimension(key).is_none() {
            let known: Vec<&str> = feature.dimensions.iter().map(|d| d.key).collect();
            bail!(
                "{} has no filter {key:?}; available: {}",
                feature.name,
                known.join(", ")
            );
        }
        query = query.select(key, value.trim());
    }
    Ok(query)
}

/// Menus list what the viewer can see, before any selection narrows it.
fn menu_query(search: String, filters: &[String]) -> anyhow::Result<Query> {
    if !filters.is_empty() {
        bail!("options lists every value the viewer can see; --filter does not apply here");
    }
    Ok(Query::new().search(search))
}

fn run_view(snapshot: &Snapshot, view: ViewArgs, action: ViewAction) -> anyhow::Result<()> {
    match view.feature {
        FeatureKind::Incidents => {
            run_feature(&features::incidents(), &snapshot.incidents, snapshot, view, action)
        }
        FeatureKind::Permissions => {
            run_feature(&features::permissions(), &snapshot.permissions, snapshot, view, action)
        }
        FeatureKind::RiskFactors => {
            run_feature(&features::risk_factors(), &snapshot.risk_factors, snapshot, view, action)
        }
        FeatureKind::Nee => {
            run_feature(&features::nee_records(), &snapshot.nee_records, snapshot, view, action)
        }
        FeatureKind::Dropouts => {
            run_feature(&features::dropouts(), &snapshot.dropouts, snapshot, view, action)
        }
    }
}

fn run_feature<R: StudentRecord>(
    feature: &Feature<R>,
    records: &[R],
    snapshot: &Snapshot,
    view: ViewArgs,
    action: ViewAction,
) -> anyhow::Result<()> {
    let (viewer, viewer_label) = resolve_viewer(snapshot, view.staff_id)?;
    let directory = StudentDirectory::from_snapshot(snapshot);

    match action {
        ViewAction::Summary { limit } => {
            let query = build_query(feature, view.search, &view.filters)?;
            let visible = feature.view(records, &directory, &viewer, &snapshot.assignments, &query);
            let summaries = feature.summaries(&visible);

            if summaries.is_empty() {
                let unassigned = !snapshot
                    .assignments
                    .iter()
                    .any(|assignment| assignment.staff_id == viewer.staff_id);
                if viewer.restricted && unassigned {
                    println!("No sections are assigned to {viewer_label}.");
                } else {
                    println!("No {} match this view.", feature.name);
                }
                return Ok(());
            }

            println!("Students by {} {}:", feature.notable_label, feature.name);
            for summary in summaries.iter().take(limit) {
                println!(
                    "- {} ({} {}) {} {} of {} records, latest {}",
                    summary.student_name,
                    summary.grade,
                    summary.section,
                    summary.notable_count,
                    feature.notable_label,
                    summary.total_count,
                    format_date(summary.latest)
                );
            }
        }
        ViewAction::Options => {
            let query = menu_query(view.search, &view.filters)?;
            let visible = feature.view(records, &directory, &viewer, &snapshot.assignments, &query);
            for dimension in feature.options(&visible) {
                println!("{} ({}):", dimension.label, dimension.key);
                for tag in dimension.values {
                    println!("  {} [{}]", tag.value, tag.count);
                }
            }
        }
        ViewAction::Export { out } => {
            let query = build_query(feature, view.search, &view.filters)?;
            let visible = feature.view(records, &directory, &viewer, &snapshot.assignments, &query);
            let table = feature.table(&visible);
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_csv(&table, file)?;
            println!("Exported {} rows to {}.", table.rows.len(), out.display());
        }
        ViewAction::Report { out, limit } => {
            let query = build_query(feature, view.search, &view.filters)?;
            let visible = feature.view(records, &directory, &viewer, &snapshot.assignments, &query);
            let markdown = report::build_report(feature, &viewer_label, &visible, limit);
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
