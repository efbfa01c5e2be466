//! Session management for multi-turn conversations

use super::conversation::Conversation;
use super::react::{ReactAgent, TurnOutcome};
use crate::error::{QuarryError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    pub id: String,
    pub title: Option<String>,
    pub entry_count: usize,
    pub created_at: DateTime<Utc>,
}

/// In-memory conversations keyed by thread id.
///
/// Each conversation sits behind its own async mutex, so turns on one thread
/// run one at a time while other threads proceed.
#[derive(Default)]
pub struct SessionStore {
    threads: RwLock<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new thread and return its id
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.threads
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(Conversation::new(id.as_str()))));
        tracing::debug!("Created thread {}", id);
        id
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Conversation>>> {
        self.threads.read().await.get(id).cloned()
    }

    pub async fn get_or_create(&self, id: &str) -> Arc<Mutex<Conversation>> {
        if let Some(conversation) = self.get(id).await {
            return conversation;
        }
        self.threads
            .write()
            .await
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new(id))))
            .clone()
    }

    /// Threads ordered by creation time
    pub async fn list(&self) -> Vec<ThreadSummary> {
        let handles: Vec<Arc<Mutex<Conversation>>> =
            self.threads.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let conversation = handle.lock().await;
            summaries.push(ThreadSummary {
                id: conversation.id().to_string(),
                title: conversation.title(),
                entry_count: conversation.len(),
                created_at: conversation.created_at(),
            });
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.threads
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| QuarryError::ThreadNotFound(id.to_string()))
    }

    /// A copy of the thread's current conversation
    pub async fn snapshot(&self, id: &str) -> Result<Conversation> {
        let handle = self
            .get(id)
            .await
            .ok_or_else(|| QuarryError::ThreadNotFound(id.to_string()))?;
        let conversation = handle.lock().await;
        Ok(conversation.clone())
    }

    /// Copies of every conversation, oldest first
    pub async fn export_all(&self) -> Vec<Conversation> {
        let handles: Vec<Arc<Mutex<Conversation>>> =
            self.threads.read().await.values().cloned().collect();

        let mut conversations = Vec::with_capacity(handles.len());
        for handle in handles {
            conversations.push(handle.lock().await.clone());
        }
        conversations.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        conversations
    }

    /// Run one turn on a thread, creating the thread if needed
    pub async fn run_turn(
        &self,
        agent: &ReactAgent,
        thread_id: &str,
        user_input: &str,
    ) -> Result<TurnOutcome> {
        let handle = self.get_or_create(thread_id).await;
        let mut conversation = handle.lock().await;
        agent.run_turn(&mut conversation, user_input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_list() {
        let store = SessionStore::new();
        let id = store.create().await;
        assert_eq!(uuid::Uuid::parse_str(&id).unwrap().get_version_num(), 4);

        store
            .get(&id)
            .await
            .unwrap()
            .lock()
            .await
            .push_user("K5 브레이크 문제 검색해줘")
            .unwrap();

        let threads = store.list().await;
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].entry_count, 1);
        assert_eq!(threads[0].title.as_deref(), Some("K5 브레이크 문제 검색해줘"));
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_thread() {
        let store = SessionStore::new();
        let a = store.get_or_create("t1").await;
        a.lock().await.push_user("hi").unwrap();
        let b = store.get_or_create("t1").await;
        assert_eq!(b.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_snapshot() {
        let store = SessionStore::new();
        store.get_or_create("t1").await;
        assert_eq!(store.snapshot("t1").await.unwrap().id(), "t1");

        store.delete("t1").await.unwrap();
        assert!(matches!(
            store.delete("t1").await,
            Err(QuarryError::ThreadNotFound(_))
        ));
        assert!(store.snapshot("t1").await.is_err());
    }

    #[tokio::test]
    async fn test_export_all_in_creation_order() {
        let store = SessionStore::new();
        assert!(store.export_all().await.is_empty());

        store.get_or_create("first").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.get_or_create("second").await;
        second.lock().await.push_user("K5").unwrap();

        let all = store.export_all().await;
        let ids: Vec<&str> = all.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(all[1].len(), 1);
    }
}
