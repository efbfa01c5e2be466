//! Config command

use crate::app::OutputFormat;
use anyhow::Result;
use quarry_core::AgentContext;
use serde_json::json;

pub async fn run(context: &AgentContext, format: OutputFormat) -> Result<()> {
    let es = &context.config().elasticsearch;
    let registry = context.registry();

    match format {
        OutputFormat::Json => {
            let collections: Vec<_> = registry
                .iter()
                .map(|(id, c)| {
                    json!({
                        "id": id,
                        "display_name": c.display_name,
                        "description": c.description,
                        "search_fields": c.search_fields,
                        "result_format": c.result_format.kind(),
                    })
                })
                .collect();
            let value = json!({
                "url": es.url,
                "default_collection": es.default_collection,
                "collections_file": es.collections_file,
                "model": context.config().llm_service.model,
                "collections": collections,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Md => {
            println!("# Configuration\n");
            println!("- **Elasticsearch**: {}", es.url);
            println!("- **Default collection**: `{}`", es.default_collection);
            println!("- **Collections file**: {}\n", es.collections_file.display());
            println!("| Collection | Name | Format | Description |");
            println!("|------------|------|--------|-------------|");
            for (id, c) in registry.iter() {
                println!(
                    "| `{}` | {} | {} | {} |",
                    id,
                    c.display_name.as_deref().unwrap_or(id),
                    c.result_format.kind(),
                    c.description
                );
            }
        }
        OutputFormat::Cli => {
            println!("Elasticsearch:      {}", es.url);
            println!("Default collection: {}", es.default_collection);
            println!("Collections file:   {}", es.collections_file.display());
            println!("Model:              {}", context.config().llm_service.model);

            if registry.is_empty() {
                println!("\nNo collections configured.");
                return Ok(());
            }

            println!("\nConfigured collections:");
            for (id, c) in registry.iter() {
                println!(
                    "  {:<20} {:<10} {}",
                    id,
                    c.result_format.kind(),
                    c.display_name.as_deref().unwrap_or("")
                );
                if !c.description.is_empty() {
                    println!("  {:<20} {}", "", c.description);
                }
            }
        }
    }

    Ok(())
}
