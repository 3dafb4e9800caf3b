//! Initialize the data directory and database.

use crate::config::Settings;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let pool = super::open_database(settings).await?;

    println!(
        "  {} Data directory: {}",
        console::style("✓").green(),
        settings.data_dir.display()
    );
    println!(
        "  {} Documents directory: {}",
        console::style("✓").green(),
        settings.documents_dir.display()
    );
    println!(
        "  {} Database ready: {}",
        console::style("✓").green(),
        pool.database_url()
    );

    Ok(())
}
