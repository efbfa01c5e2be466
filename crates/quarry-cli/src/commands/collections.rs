//! Collections command

use crate::app::OutputFormat;
use crate::output;
use anyhow::Result;
use quarry_core::AgentContext;

pub async fn run(context: &AgentContext, format: OutputFormat) -> Result<()> {
    let listing = context.adapter().list_collections().await?;
    print!("{}", output::format_listing(&listing, format));
    Ok(())
}
