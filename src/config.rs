use std::path::PathBuf;

use anyhow::bail;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// A JSON-serialized snapshot, handy for offline review.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub source: RecordSource,
}

impl AppConfig {
    /// A snapshot file wins over the database when both are configured.
    pub fn resolve(
        database_url: Option<String>,
        snapshot_path: Option<PathBuf>,
        max_connections: u32,
    ) -> anyhow::Result<Self> {
        let database_url = database_url.filter(|url| !url.trim().is_empty());

        let source = match (snapshot_path, database_url) {
            (Some(path), _) => RecordSource::File(path),
            (None, Some(database_url)) => RecordSource::Postgres {
                database_url,
                max_connections: max_connections.max(1),
            },
            (None, None) => {
                bail!("set DATABASE_URL (or --database-url) or pass --snapshot with a JSON snapshot")
            }
        };

        Ok(Self { source })
    }

    pub fn database_url(&self) -> anyhow::Result<(&str, u32)> {
        match &self.source {
            RecordSource::Postgres {
                database_url,
                max_connections,
            } => Ok((database_url.as_str(), *max_connections)),
            RecordSource::File(path) => bail!(
                "this command writes to Postgres; drop --snapshot {} and set DATABASE_URL",
                path.display()
            ),
        }
    }
}
