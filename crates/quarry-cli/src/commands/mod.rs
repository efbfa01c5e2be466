//! CLI command handlers

pub mod ask;
pub mod chat;
pub mod collections;
pub mod config;
pub mod health;
pub mod search;

use quarry_core::QuarryError;

/// Join positional words into one query, rejecting blank input
pub fn join_query(words: &[String]) -> Result<String, QuarryError> {
    let query = words.join(" ");
    if query.trim().is_empty() {
        return Err(QuarryError::InvalidInput("query must not be empty".to_string()));
    }
    Ok(query)
}
