//! Show job counts and per-stage performance statistics.

use crate::config::Settings;
use crate::repository::{AnalysisCacheRepository, JobRepository, MetricsRepository};

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let pool = super::open_database(settings).await?;
    let cache = AnalysisCacheRepository::new(pool.clone(), settings.cache_ttl_hours);
    let jobs = JobRepository::new(pool.clone());
    let metrics = MetricsRepository::new(pool);

    println!("  Cache entries: {}", cache.count().await?);
    println!("  Jobs: {}", jobs.count().await?);

    let stats = metrics.stage_stats().await?;
    if stats.is_empty() {
        println!("  No performance metrics recorded yet");
        return Ok(());
    }

    println!(
        "  {:<16} {:<18} {:>8} {:>8} {:>8} {:>8}",
        "stage", "mime type", "samples", "p50 ms", "p95 ms", "mean ms"
    );
    for entry in stats {
        println!(
            "  {:<16} {:<18} {:>8} {:>8} {:>8} {:>8}",
            entry.stage, entry.mime_type, entry.samples, entry.p50_ms, entry.p95_ms, entry.mean_ms
        );
    }

    Ok(())
}
