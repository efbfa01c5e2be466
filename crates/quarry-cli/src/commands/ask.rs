//! Ask command

use super::join_query;
use crate::app::{AskArgs, OutputFormat};
use crate::output::{self, Usage};
use anyhow::Result;
use quarry_core::AgentContext;

pub async fn run(args: AskArgs, context: AgentContext, format: OutputFormat) -> Result<()> {
    let query = join_query(&args.query)?;
    let context = match args.collection {
        Some(collection) => context.with_default_collection(collection),
        None => context,
    };

    let thread_id = context.sessions().create().await;
    let outcome = context.ask(&thread_id, &query).await?;
    let conversation = context.sessions().snapshot(&thread_id).await?;
    let usage = args.trace.then(|| Usage::of(&context));

    print!(
        "{}",
        output::format_turn(&conversation, &outcome, usage.as_ref(), format)
    );
    Ok(())
}
