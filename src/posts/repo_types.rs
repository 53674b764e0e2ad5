use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub username: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Post document. `username` is a denormalized copy of the author's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub username: String,
    pub content: String,
    pub image: String,
    pub video: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub likes: Vec<String>,
    pub likes_count: i32,
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new(
        username: impl Into<String>,
        content: impl Into<String>,
        image: Option<String>,
        video: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            content: content.into(),
            image: image.unwrap_or_default(),
            video: video.unwrap_or_default(),
            created_at: OffsetDateTime::now_utc(),
            likes: Vec::new(),
            likes_count: 0,
            comments: Vec::new(),
        }
    }

    pub fn is_liked_by(&self, username: &str) -> bool {
        self.likes.iter().any(|u| u == username)
    }

    /// Like or unlike on behalf of `username`; `likes_count` follows `likes`.
    pub fn toggle_like(&mut self, username: &str) {
        if let Some(pos) = self.likes.iter().position(|u| u == username) {
            self.likes.remove(pos);
        } else {
            self.likes.push(username.to_string());
        }
        self.likes_count = self.likes.len() as i32;
    }
}

/// Row shape as stored in Postgres.
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub username: String,
    pub content: String,
    pub image: String,
    pub video: String,
    pub created_at: OffsetDateTime,
    pub likes: Vec<String>,
    pub likes_count: i32,
    pub comments: Json<Vec<Comment>>,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            content: r.content,
            image: r.image,
            video: r.video,
            created_at: r.created_at,
            likes: r.likes,
            likes_count: r.likes_count,
            comments: r.comments.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_like_twice_restores_state() {
        let mut post = Post::new("alice", "hello", None, None);
        post.toggle_like("bob");
        assert_eq!(post.likes, vec!["bob".to_string()]);
        assert_eq!(post.likes_count, 1);

        post.toggle_like("bob");
        assert!(post.likes.is_empty());
        assert_eq!(post.likes_count, 0);
    }

    #[test]
    fn toggle_like_keeps_count_in_step_for_many_users() {
        let mut post = Post::new("alice", "hello", None, None);
        for name in ["bob", "carol", "bob", "dave", "carol", "erin", "bob"] {
            post.toggle_like(name);
            assert_eq!(post.likes_count as usize, post.likes.len());
        }
        assert_eq!(post.likes, vec!["dave", "erin", "bob"]);
    }

    #[test]
    fn comment_timestamps_serialize_as_rfc3339() {
        let comment = Comment {
            username: "bob".into(),
            content: "nice".into(),
            created_at: time::macros::datetime!(2024-05-01 12:00 UTC),
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");
        let back: Comment = serde_json::from_value(json).unwrap();
        assert_eq!(back, comment);
    }
}
