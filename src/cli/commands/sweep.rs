//! Remove expired cache entries.

use chrono::Utc;

use crate::config::Settings;
use crate::repository::AnalysisCacheRepository;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let pool = super::open_database(settings).await?;
    let cache = AnalysisCacheRepository::new(pool, settings.cache_ttl_hours);

    let removed = cache.sweep_expired(Utc::now()).await?;
    println!(
        "  {} Removed {} expired cache entries",
        console::style("✓").green(),
        removed
    );

    Ok(())
}
