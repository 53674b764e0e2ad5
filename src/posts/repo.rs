use axum::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::posts::repo_types::{Comment, Post, PostRow};

#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Every post, newest first.
    async fn list_all(&self) -> Result<Vec<Post>>;

    /// Posts authored by `username`, newest first.
    async fn list_by_username(&self, username: &str) -> Result<Vec<Post>>;

    async fn insert(&self, post: &Post) -> Result<()>;

    /// Atomically add or remove `username` from the post's likes.
    /// `None` when the post does not exist.
    async fn toggle_like(&self, id: Uuid, username: &str) -> Result<Option<Post>>;

    /// Atomically append a comment. `None` when the post does not exist.
    async fn push_comment(&self, id: Uuid, comment: &Comment) -> Result<Option<Post>>;
}

const POST_COLUMNS: &str =
    "id, username, content, image, video, created_at, likes, likes_count, comments";

#[derive(Clone)]
pub struct PgPostRepo {
    db: PgPool,
}

impl PgPostRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepo for PgPostRepo {
    async fn list_all(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_by_username(&self, username: &str) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE username = $1 ORDER BY created_at DESC"
        ))
        .bind(username)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, username, content, image, video, created_at,
                               likes, likes_count, comments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(post.id)
        .bind(&post.username)
        .bind(&post.content)
        .bind(&post.image)
        .bind(&post.video)
        .bind(post.created_at)
        .bind(&post.likes)
        .bind(post.likes_count)
        .bind(Json(&post.comments))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn toggle_like(&self, id: Uuid, username: &str) -> Result<Option<Post>> {
        // Both SET expressions read the pre-update row, so the count is
        // derived from the same array the toggle is applied to.
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
               SET likes = CASE WHEN $2 = ANY(likes)
                                THEN array_remove(likes, $2)
                                ELSE array_append(likes, $2) END,
                   likes_count = CASE WHEN $2 = ANY(likes)
                                      THEN cardinality(array_remove(likes, $2))
                                      ELSE cardinality(likes) + 1 END
             WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Post::from))
    }

    async fn push_comment(&self, id: Uuid, comment: &Comment) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
               SET comments = comments || $2
             WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json([comment]))
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Post::from))
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::error::AppError;

    async fn seeded(pool: PgPool) -> (PgPostRepo, Uuid) {
        let repo = PgPostRepo::new(pool);
        let post = Post::new("alice", "hello", None, None);
        repo.insert(&post).await.unwrap();
        (repo, post.id)
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn toggle_like_twice_restores_the_post(pool: PgPool) {
        let (repo, id) = seeded(pool).await;

        let liked = repo.toggle_like(id, "bob").await.unwrap().unwrap();
        assert_eq!(liked.likes, vec!["bob"]);
        assert_eq!(liked.likes_count, 1);

        let other = repo.toggle_like(id, "carol").await.unwrap().unwrap();
        assert_eq!(other.likes, vec!["bob", "carol"]);
        assert_eq!(other.likes_count, 2);

        let unliked = repo.toggle_like(id, "bob").await.unwrap().unwrap();
        assert_eq!(unliked.likes, vec!["carol"]);
        assert_eq!(unliked.likes_count, 1);

        assert!(repo.toggle_like(Uuid::new_v4(), "bob").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn concurrent_toggles_keep_every_like(pool: PgPool) {
        let (repo, id) = seeded(pool).await;

        let mut tasks = Vec::new();
        for i in 0..16 {
            let repo = repo.clone();
            tasks.push(tokio::spawn(async move {
                repo.toggle_like(id, &format!("user{i}")).await.unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let post = repo.list_all().await.unwrap().remove(0);
        assert_eq!(post.likes.len(), 16);
        assert_eq!(post.likes_count, 16);
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn likes_count_must_match_likes(pool: PgPool) {
        let repo = PgPostRepo::new(pool);
        let mut post = Post::new("alice", "hello", None, None);
        post.likes_count = 3;

        let err = repo.insert(&post).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL database"]
    async fn push_comment_appends_in_order(pool: PgPool) {
        let (repo, id) = seeded(pool).await;

        for (who, text) in [("bob", "first"), ("carol", "second")] {
            let comment = Comment {
                username: who.into(),
                content: text.into(),
                created_at: OffsetDateTime::now_utc(),
            };
            repo.push_comment(id, &comment).await.unwrap().unwrap();
        }

        let post = repo.list_by_username("alice").await.unwrap().remove(0);
        let contents: Vec<_> = post.comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
        assert_eq!(post.comments[0].username, "bob");

        let missing = Comment {
            username: "bob".into(),
            content: "lost".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        assert!(repo.push_comment(Uuid::new_v4(), &missing).await.unwrap().is_none());
    }
}
