//! CLI command implementations.

pub mod init;
pub mod process;
pub mod stats;
pub mod sweep;
pub mod tools;

use crate::config::Settings;
use crate::repository::{run_migrations, SqlitePool};

/// Open the configured database, running pending migrations.
pub async fn open_database(settings: &Settings) -> anyhow::Result<SqlitePool> {
    settings.ensure_dirs()?;
    let pool = SqlitePool::new(&settings.database_url());
    run_migrations(pool.database_url()).await?;
    Ok(pool)
}
