use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{email_taken, CommentStore, UserStore};
use crate::{
    error::AppResult,
    models::{Comment, User},
};

/// In-process store used for demos and tests
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_in_use(users: &HashMap<Uuid, User>, user: &User) -> bool {
    users
        .values()
        .any(|other| other.id != user.id && other.email == user.email)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if email_in_use(&users, user) {
            return Err(email_taken());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if email_in_use(&users, user) {
            return Err(email_taken());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.users.read().await.len())
    }

    async fn delete_all(&self) -> AppResult<()> {
        self.users.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert(&self, comment: &Comment) -> AppResult<()> {
        self.comments
            .write()
            .await
            .insert(comment.id, comment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn find_by_content(&self, content_id: &str) -> AppResult<Vec<Comment>> {
        let comments = self.comments.read().await;
        let mut matching: Vec<Comment> = comments
            .values()
            .filter(|comment| comment.content_id == content_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.comments.write().await.remove(&id);
        Ok(())
    }
}
