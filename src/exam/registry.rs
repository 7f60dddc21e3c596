// src/exam/registry.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::exam::runner::SessionHandle;

/// Live sessions by id. Lookups are scoped to the owning user.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: SessionHandle) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, h| h.is_alive());
        sessions.insert(handle.id(), handle);
    }

    /// The session if it exists, is still alive and belongs to `owner`.
    pub async fn get(&self, id: Uuid, owner: Uuid) -> Option<SessionHandle> {
        let handle = self.sessions.read().await.get(&id).cloned()?;
        if !handle.is_alive() {
            self.sessions.write().await.remove(&id);
            return None;
        }
        (handle.owner() == owner).then_some(handle)
    }

    /// Removes the session of `owner` and returns its handle.
    pub async fn remove(&self, id: Uuid, owner: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let owned = sessions.get(&id).is_some_and(|h| h.owner() == owner);
        if owned { sessions.remove(&id) } else { None }
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        exam::{
            answers::Answer,
            session::{SessionContext, SessionSpec},
            runner::spawn_session,
        },
        models::question::{ExamCategory, Question, QuestionKind},
        storage::MemoryStorage,
        utils::jwt::CurrentUser,
    };
    use std::time::Duration;

    fn handle_for(owner: Uuid) -> SessionHandle {
        let spec = SessionSpec {
            category: ExamCategory::Writing,
            questions: Arc::from(vec![Question {
                id: "1".to_string(),
                kind: QuestionKind::FreeText,
                prompt: "Describe the chart.".to_string(),
                options: None,
                correct_answer: Answer::single("essay"),
                passage: None,
                audio: None,
            }]),
            duration: Duration::from_secs(3600),
        };
        let context = SessionContext {
            user: CurrentUser {
                id: owner,
                email: "writer@example.com".to_string(),
            },
        };
        spawn_session(
            spec,
            context,
            Arc::new(MemoryStorage::new()),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sessions_are_scoped_to_owner() {
        let registry = SessionRegistry::new();
        let owner = Uuid::new_v4();
        let handle = handle_for(owner);
        let id = handle.id();
        registry.insert(handle).await;

        assert!(registry.get(id, owner).await.is_some());
        assert!(registry.get(id, Uuid::new_v4()).await.is_none());
        assert!(registry.remove(id, Uuid::new_v4()).await.is_none());
        assert!(registry.remove(id, owner).await.is_some());
        assert!(registry.get(id, owner).await.is_none());
    }

    #[tokio::test]
    async fn test_dead_sessions_are_pruned() {
        let registry = SessionRegistry::new();
        let owner = Uuid::new_v4();
        let handle = handle_for(owner);
        let id = handle.id();
        handle.abandon();
        registry.insert(handle.clone()).await;

        // Let the session task observe the abandon.
        while handle.is_alive() {
            tokio::task::yield_now().await;
        }

        assert!(registry.get(id, owner).await.is_none());
        assert_eq!(registry.count().await, 0);
    }
}
