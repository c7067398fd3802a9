//! In-memory comment sink used for dry runs.

use crate::store::{CommentSink, StoreError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredComment {
    pub user_id: String,
    pub ticket_key: String,
    pub summary: String,
    pub comment: String,
}

/// Thread-safe sink keeping one comment per (user id, ticket key), last write wins.
#[derive(Clone, Default)]
pub struct MemorySink {
    items: Arc<Mutex<Vec<StoredComment>>>,
}

impl MemorySink {
    fn items(&self) -> MutexGuard<'_, Vec<StoredComment>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a cloned snapshot in insertion order.
    pub fn snapshot(&self) -> Vec<StoredComment> {
        self.items().clone()
    }

    /// Comment stored under (user id, ticket key), if any.
    pub fn find(&self, user_id: &str, ticket_key: &str) -> Option<String> {
        self.items()
            .iter()
            .find(|item| item.user_id == user_id && item.ticket_key == ticket_key)
            .map(|item| item.comment.clone())
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

#[async_trait]
impl CommentSink for MemorySink {
    async fn store(
        &self,
        user_id: &str,
        ticket_key: &str,
        summary: &str,
        comment: &str,
    ) -> Result<(), StoreError> {
        let mut items = self.items();
        match items
            .iter_mut()
            .find(|item| item.user_id == user_id && item.ticket_key == ticket_key)
        {
            Some(existing) => {
                existing.summary = summary.to_string();
                existing.comment = comment.to_string();
            }
            None => items.push(StoredComment {
                user_id: user_id.to_string(),
                ticket_key: ticket_key.to_string(),
                summary: summary.to_string(),
                comment: comment.to_string(),
            }),
        }
        Ok(())
    }
}
