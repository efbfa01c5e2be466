//! Search command

use super::join_query;
use crate::app::{OutputFormat, SearchArgs};
use crate::output;
use anyhow::Result;
use quarry_core::AgentContext;

pub async fn run(args: SearchArgs, context: &AgentContext, format: OutputFormat) -> Result<()> {
    let query = join_query(&args.query)?;
    let outcome = context
        .adapter()
        .search(&query, args.collection.as_deref(), args.limit)
        .await?;

    print!("{}", output::format_search(&outcome, format));
    Ok(())
}
