//! Process a single document through the pipeline.

use std::path::Path;

use crate::config::Settings;
use crate::models::{AnalysisKind, AnalysisSlot, JobStatus};
use crate::pipeline::{Pipeline, PipelineResult, ProcessRequest};
use crate::utils::mime;

pub async fn run(
    settings: &Settings,
    file: &Path,
    kind: AnalysisKind,
    analyze: bool,
    mime_type: Option<String>,
) -> anyhow::Result<()> {
    let content = std::fs::read(file)?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let mime_type = match mime_type {
        Some(m) => m,
        None => mime::from_filename(&filename)
            .ok_or_else(|| anyhow::anyhow!("could not guess MIME type; pass --mime-type"))?,
    };

    let pool = super::open_database(settings).await?;
    let pipeline = Pipeline::new(pool, settings);

    println!(
        "  {} Processing: {} ({}, {} bytes)",
        console::style("→").cyan(),
        filename,
        kind,
        content.len()
    );

    let result = pipeline
        .process(ProcessRequest {
            content,
            mime_type,
            filename,
            kind,
            run_analysis: analyze,
        })
        .await?;

    print_result(&result);
    Ok(())
}

fn print_result(result: &PipelineResult) {
    if result.cached {
        println!("  {} Cache hit (no job created)", console::style("✓").green());
    } else if let Some(job_id) = &result.job_id {
        println!("  {} Job: {}", console::style("✓").green(), job_id);
    }

    let status_style = match result.status {
        JobStatus::Error => console::style(result.status.as_str()).red(),
        _ => console::style(result.status.as_str()).green(),
    };
    println!("  Status: {}", status_style);
    println!("  Content hash: {}", result.content_hash);

    if let Some(text) = &result.extracted_text {
        let preview: String = text.chars().take(200).collect();
        println!(
            "  Extracted {} chars: {}{}",
            text.chars().count(),
            preview.trim(),
            if text.chars().count() > 200 { "…" } else { "" }
        );
    }

    if let Some(confidence) = &result.confidence {
        println!(
            "  Confidence: {:.1}%",
            confidence.overall_confidence * 100.0
        );
    }

    print_slot("sentiment", &result.sentiment);
    print_slot("classification", &result.classification);
    print_slot("entities", &result.entities);
    print_slot("summary", &result.summary);

    if let Some(processing) = &result.processing {
        println!(
            "  Timing: extraction {} ms, analysis {} ms, total {} ms",
            processing.extraction_ms,
            processing
                .analysis_ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "-".to_string()),
            processing.total_ms
        );
    }
}

fn print_slot<T: serde::Serialize>(name: &str, slot: &Option<AnalysisSlot<T>>) {
    let Some(slot) = slot else {
        return;
    };
    match slot {
        AnalysisSlot::Ok { result } => {
            let rendered =
                serde_json::to_string(result).unwrap_or_else(|_| "<unprintable>".to_string());
            println!("  {} {}: {}", console::style("✓").green(), name, rendered);
        }
        AnalysisSlot::Error { message } => {
            println!("  {} {}: {}", console::style("✗").red(), name, message);
        }
        AnalysisSlot::InsufficientInput => {
            println!(
                "  {} {}: insufficient input",
                console::style("-").dim(),
                name
            );
        }
        AnalysisSlot::Degraded { .. } => {
            println!(
                "  {} {}: degraded legacy data",
                console::style("!").yellow(),
                name
            );
        }
    }
}
