//! Interactive chat command

use crate::app::{ChatArgs, OutputFormat};
use crate::output::{self, Usage};
use anyhow::Result;
use quarry_core::AgentContext;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  /find <text>          search this thread, then /next and /prev
  /threads              list threads (* marks the current one)
  /new                  start a new thread
  /switch <id>          switch thread; a unique id prefix is enough
  /delete <id>          delete a thread
  /export [md|json]     dump the current thread
  /export-all [md|json] dump every thread
  /stats                generation and cache counters
  /exit                 leave";

#[derive(Debug)]
enum Line<'a> {
    Exit,
    Help,
    Export(OutputFormat),
    ExportAll(OutputFormat),
    Find(&'a str),
    Next,
    Prev,
    Threads,
    New,
    Switch(&'a str),
    Delete(&'a str),
    Stats,
    Usage(&'a str),
    Query(&'a str),
    Blank,
}

fn parse_line(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if !line.starts_with('/') {
        return Line::Query(line);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match (command, rest) {
        ("/exit" | "/quit", _) => Line::Exit,
        ("/help", _) => Line::Help,
        ("/export", "json") => Line::Export(OutputFormat::Json),
        ("/export", "md" | "") => Line::Export(OutputFormat::Md),
        ("/export-all", "json") => Line::ExportAll(OutputFormat::Json),
        ("/export-all", "md" | "") => Line::ExportAll(OutputFormat::Md),
        ("/find", term) if !term.is_empty() => Line::Find(term),
        ("/next", "") => Line::Next,
        ("/prev", "") => Line::Prev,
        ("/threads", "") => Line::Threads,
        ("/new", "") => Line::New,
        ("/switch", id) if !id.is_empty() => Line::Switch(id),
        ("/delete", id) if !id.is_empty() => Line::Delete(id),
        ("/stats", "") => Line::Stats,
        _ => Line::Usage(line),
    }
}

/// Position in the current thread's find results
#[derive(Debug, Default)]
struct FindCursor {
    matches: Vec<usize>,
    current: usize,
}

impl FindCursor {
    fn new(matches: Vec<usize>) -> Self {
        Self {
            matches,
            current: 0,
        }
    }

    fn ordinal(&self) -> Option<usize> {
        self.matches.get(self.current).copied()
    }

    fn forward(&mut self) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.matches.len();
        self.ordinal()
    }

    fn back(&mut self) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = self
            .current
            .checked_sub(1)
            .unwrap_or(self.matches.len() - 1);
        self.ordinal()
    }
}

/// Resolve a full thread id or a unique prefix of one
async fn resolve_thread(context: &AgentContext, id: &str) -> Option<String> {
    let threads = context.sessions().list().await;
    if let Some(thread) = threads.iter().find(|t| t.id == id) {
        return Some(thread.id.clone());
    }
    let mut candidates = threads.into_iter().filter(|t| t.id.starts_with(id));
    match (candidates.next(), candidates.next()) {
        (Some(thread), None) => Some(thread.id),
        _ => None,
    }
}

async fn show_match(context: &AgentContext, thread_id: &str, cursor: &FindCursor) -> Result<()> {
    let Some(ordinal) = cursor.ordinal() else {
        eprintln!("No matches");
        return Ok(());
    };
    let conversation = context.sessions().snapshot(thread_id).await?;
    if let Some(entry) = conversation.entries().get(ordinal) {
        print!(
            "{}",
            output::format_found(entry, cursor.current + 1, cursor.matches.len())
        );
    }
    Ok(())
}

pub async fn run(args: ChatArgs, context: AgentContext, format: OutputFormat) -> Result<()> {
    let context = match args.collection {
        Some(collection) => context.with_default_collection(collection),
        None => context,
    };
    let mut thread_id = context.sessions().create().await;
    let mut cursor = FindCursor::default();
    tracing::info!("Chat thread {}", thread_id);

    eprintln!("quarry chat (thread {}). /help for commands, /exit to leave.", thread_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            Line::Blank => continue,
            Line::Exit => break,
            Line::Help => eprintln!("{}", HELP),
            Line::Usage(command) => {
                eprintln!("Unknown command: {} (try /help)", command);
            }
            Line::Export(export_format) => {
                let conversation = context.sessions().snapshot(&thread_id).await?;
                print!("{}", output::format_conversation(&conversation, export_format));
            }
            Line::ExportAll(export_format) => {
                let conversations = context.sessions().export_all().await;
                print!(
                    "{}",
                    output::format_all_conversations(&conversations, export_format)
                );
            }
            Line::Find(term) => {
                let conversation = context.sessions().snapshot(&thread_id).await?;
                cursor = FindCursor::new(conversation.find(term));
                show_match(&context, &thread_id, &cursor).await?;
            }
            Line::Next => {
                cursor.forward();
                show_match(&context, &thread_id, &cursor).await?;
            }
            Line::Prev => {
                cursor.back();
                show_match(&context, &thread_id, &cursor).await?;
            }
            Line::Threads => {
                let threads = context.sessions().list().await;
                print!("{}", output::format_threads(&threads, &thread_id, format));
            }
            Line::New => {
                thread_id = context.sessions().create().await;
                cursor = FindCursor::default();
                eprintln!("Started thread {}", thread_id);
            }
            Line::Switch(id) => match resolve_thread(&context, id).await {
                Some(id) => {
                    thread_id = id;
                    cursor = FindCursor::default();
                    eprintln!("Switched to thread {}", thread_id);
                }
                None => eprintln!("Thread not found: {}", id),
            },
            Line::Delete(id) => match resolve_thread(&context, id).await {
                Some(id) => {
                    context.sessions().delete(&id).await?;
                    eprintln!("Deleted thread {}", id);
                    if id == thread_id {
                        thread_id = context.sessions().create().await;
                        cursor = FindCursor::default();
                        eprintln!("Started thread {}", thread_id);
                    }
                }
                None => eprintln!("Thread not found: {}", id),
            },
            Line::Stats => {
                print!("{}", output::format_usage(&Usage::of(&context), format));
            }
            Line::Query(query) => match context.ask(&thread_id, query).await {
                Ok(outcome) => {
                    let conversation = context.sessions().snapshot(&thread_id).await?;
                    let usage = args.trace.then(|| Usage::of(&context));
                    print!(
                        "{}",
                        output::format_turn(&conversation, &outcome, usage.as_ref(), format)
                    );
                    std::io::stdout().flush()?;
                }
                // the thread stays usable after a failed turn
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    Ok(())
}
