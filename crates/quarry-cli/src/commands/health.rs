//! Health command

use crate::app::OutputFormat;
use anyhow::Result;
use quarry_core::AgentContext;
use serde_json::json;
use std::time::Instant;

/// Report whether the search index is reachable; never fails on an unreachable index
pub async fn run(context: &AgentContext, format: OutputFormat) -> Result<()> {
    let index = context.index();
    let start = Instant::now();
    let result = index.cluster_info().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match (&result, format) {
        (Ok(info), OutputFormat::Json) => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "status": "online",
                "backend": index.backend_name(),
                "cluster_name": info.cluster_name,
                "version": info.version,
                "latency_ms": latency_ms,
            }))?
        ),
        (Err(e), OutputFormat::Json) => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "status": "offline",
                "backend": index.backend_name(),
                "error": e.to_string(),
            }))?
        ),
        (Ok(info), _) => {
            println!("Search index: online ({})", index.backend_name());
            println!("  Cluster: {}", info.cluster_name);
            if let Some(ref version) = info.version {
                println!("  Version: {}", version);
            }
            println!("  Latency: {} ms", latency_ms);
        }
        (Err(e), _) => {
            println!("Search index: offline ({})", index.backend_name());
            println!("  Reason: {}", e);
        }
    }

    Ok(())
}
