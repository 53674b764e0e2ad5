//! In-process document store used with `STORE_BACKEND=memory` and in tests.
//!
//! Each mutation runs under a single write lock, so like toggles and comment
//! appends are atomic just like the Postgres statements.

use axum::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::UserRepo;
use crate::auth::repo_types::{ProfileUpdate, User};
use crate::error::{AppError, Result};
use crate::posts::repo::PostRepo;
use crate::posts::repo_types::{Comment, Post};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    posts: RwLock<Vec<Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    // Later inserts win ties on equal timestamps.
    posts.reverse();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.name == name).cloned())
    }

    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.name == user.name) {
            return Err(AppError::Conflict("User already exists!".into()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update_profile(&self, name: &str, update: &ProfileUpdate) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.name == name).map(|user| {
            update.apply(user);
            user.clone()
        }))
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Post>> {
        Ok(newest_first(self.posts.read().await.clone()))
    }

    async fn list_by_username(&self, username: &str) -> Result<Vec<Post>> {
        let posts = self.posts.read().await;
        Ok(newest_first(
            posts.iter().filter(|p| p.username == username).cloned().collect(),
        ))
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        self.posts.write().await.push(post.clone());
        Ok(())
    }

    async fn toggle_like(&self, id: Uuid, username: &str) -> Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        Ok(posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.toggle_like(username);
            post.clone()
        }))
    }

    async fn push_comment(&self, id: Uuid, comment: &Comment) -> Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        Ok(posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.comments.push(comment.clone());
            post.clone()
        }))
    }
}
