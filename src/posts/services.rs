use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::media;
use crate::posts::dto::NewPostForm;
use crate::posts::repo_types::{Comment, Post};
use crate::state::AppState;

/// All posts, newest first. A store failure degrades to an empty feed.
pub async fn list_feed(st: &AppState) -> Vec<Post> {
    match st.posts.list_all().await {
        Ok(posts) => posts,
        Err(e) => {
            error!(error = %e, "failed to load feed");
            Vec::new()
        }
    }
}

pub async fn create_post(st: &AppState, username: &str, form: NewPostForm) -> Result<Post> {
    if form.content.is_empty() && form.image.is_none() && form.video.is_none() {
        return Err(AppError::Validation(
            "Post content, image, or video is required".into(),
        ));
    }

    let files: Vec<_> = form.image.iter().chain(form.video.iter()).collect();
    let mut saved = media::services::persist_all(st, &files).await?.into_iter();
    let image = form.image.as_ref().and_then(|_| saved.next());
    let video = form.video.as_ref().and_then(|_| saved.next());

    let post = Post::new(username, form.content, image, video);
    if let Err(e) = st.posts.insert(&post).await {
        let written: Vec<String> = [&post.image, &post.video]
            .into_iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        media::services::discard(st, &written).await;
        return Err(e);
    }

    info!(post_id = %post.id, user = %username, "post created");
    Ok(post)
}

/// Anything that is not a known post id resolves to "Post not found".
pub fn parse_post_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Post not found".into()))
}

pub async fn toggle_like(st: &AppState, post_id: Uuid, username: &str) -> Result<Post> {
    let post = st
        .posts
        .toggle_like(post_id, username)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
    info!(
        %post_id,
        user = %username,
        liked = post.is_liked_by(username),
        likes_count = post.likes_count,
        "like toggled"
    );
    Ok(post)
}

/// Appends a comment. Blank content is ignored and yields `Ok(None)`.
pub async fn add_comment(
    st: &AppState,
    post_id: Uuid,
    username: &str,
    content: &str,
) -> Result<Option<Post>> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(None);
    }

    let comment = Comment {
        username: username.to_string(),
        content: content.to_string(),
        created_at: OffsetDateTime::now_utc(),
    };
    let post = st
        .posts
        .push_comment(post_id, &comment)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
    info!(%post_id, user = %username, comments = post.comments.len(), "comment added");
    Ok(Some(post))
}

#[cfg(test)]
mod tests {
    use axum::async_trait;
    use bytes::Bytes;
    use std::sync::Arc;
    use time::Duration;

    use super::*;
    use crate::auth::dto::{LoginForm, SignupForm};
    use crate::auth::services::{login, signup};
    use crate::media::UploadedFile;
    use crate::posts::repo::PostRepo;

    fn text_post(content: &str) -> NewPostForm {
        NewPostForm {
            content: content.into(),
            ..Default::default()
        }
    }

    fn file(field: &str, name: &str, content_type: &str) -> UploadedFile {
        UploadedFile {
            field: field.into(),
            file_name: name.into(),
            content_type: content_type.into(),
            body: Bytes::from_static(b"media"),
        }
    }

    #[tokio::test]
    async fn empty_post_without_media_is_rejected() {
        let st = AppState::fake();
        let err = create_post(&st, "alice", text_post("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_feed(&st).await.is_empty());
    }

    #[tokio::test]
    async fn whitespace_post_is_kept_as_submitted() {
        let st = AppState::fake();
        let post = create_post(&st, "alice", text_post("   ")).await.unwrap();
        assert_eq!(post.content, "   ");

        let feed = list_feed(&st).await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].content, "   ");
    }

    #[tokio::test]
    async fn media_only_post_is_accepted() {
        let (st, uploads) = AppState::fake_with_uploads();
        let form = NewPostForm {
            content: String::new(),
            image: Some(file("image", "cat.png", "image/png")),
            video: Some(file("video", "cat.mp4", "video/mp4")),
        };

        let post = create_post(&st, "alice", form).await.unwrap();
        assert!(post.image.starts_with("/uploads/") && post.image.ends_with("-cat.png"));
        assert!(post.video.starts_with("/uploads/") && post.video.ends_with("-cat.mp4"));
        assert_eq!(post.content, "");
        assert_eq!(uploads.files.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn video_only_post_leaves_image_empty() {
        let st = AppState::fake();
        let form = NewPostForm {
            video: Some(file("video", "clip.mp4", "video/mp4")),
            ..Default::default()
        };
        let post = create_post(&st, "alice", form).await.unwrap();
        assert_eq!(post.image, "");
        assert!(post.video.ends_with("-clip.mp4"));
    }

    struct BrokenPosts;

    #[async_trait]
    impl PostRepo for BrokenPosts {
        async fn list_all(&self) -> Result<Vec<Post>> {
            Err(AppError::Store(sqlx::Error::PoolTimedOut))
        }
        async fn list_by_username(&self, _: &str) -> Result<Vec<Post>> {
            Err(AppError::Store(sqlx::Error::PoolTimedOut))
        }
        async fn insert(&self, _: &Post) -> Result<()> {
            Err(AppError::Store(sqlx::Error::PoolTimedOut))
        }
        async fn toggle_like(&self, _: Uuid, _: &str) -> Result<Option<Post>> {
            Err(AppError::Store(sqlx::Error::PoolTimedOut))
        }
        async fn push_comment(&self, _: Uuid, _: &Comment) -> Result<Option<Post>> {
            Err(AppError::Store(sqlx::Error::PoolTimedOut))
        }
    }

    fn broken_state() -> (AppState, Arc<crate::storage::MemoryStorage>) {
        let (mut st, uploads) = AppState::fake_with_uploads();
        st.posts = Arc::new(BrokenPosts);
        (st, uploads)
    }

    #[tokio::test]
    async fn failed_save_removes_written_media() {
        let (st, uploads) = broken_state();
        let form = NewPostForm {
            content: "hi".into(),
            image: Some(file("image", "cat.png", "image/png")),
            video: None,
        };

        let err = create_post(&st, "alice", form).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(uploads.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn feed_degrades_to_empty_on_store_error() {
        let (st, _) = broken_state();
        assert!(list_feed(&st).await.is_empty());
    }

    #[tokio::test]
    async fn feed_is_newest_first() {
        let st = AppState::fake();
        let now = OffsetDateTime::now_utc();
        for (i, minutes) in [5, 1, 30, 12].into_iter().enumerate() {
            let mut post = Post::new("alice", format!("p{i}"), None, None);
            post.created_at = now - Duration::minutes(minutes);
            st.posts.insert(&post).await.unwrap();
        }

        let feed = list_feed(&st).await;
        assert_eq!(feed.len(), 4);
        assert!(feed.windows(2).all(|w| w[0].created_at > w[1].created_at));
        assert_eq!(feed[0].content, "p1");
    }

    #[tokio::test]
    async fn like_of_unknown_post_is_not_found() {
        let st = AppState::fake();
        let err = toggle_like(&st, Uuid::new_v4(), "bob").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(parse_post_id("nope"), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn likes_count_tracks_likes() {
        let st = AppState::fake();
        let post = create_post(&st, "alice", text_post("hello")).await.unwrap();

        for (who, expected) in [("bob", 1), ("carol", 2), ("bob", 1), ("alice", 2), ("carol", 1)] {
            let p = toggle_like(&st, post.id, who).await.unwrap();
            assert_eq!(p.likes_count as usize, p.likes.len());
            assert_eq!(p.likes.len(), expected);
        }
    }

    #[tokio::test]
    async fn blank_comment_leaves_post_untouched() {
        let st = AppState::fake();
        let post = create_post(&st, "alice", text_post("hello")).await.unwrap();

        assert!(add_comment(&st, post.id, "bob", "   \n\t").await.unwrap().is_none());
        assert!(list_feed(&st).await[0].comments.is_empty());
    }

    #[tokio::test]
    async fn comment_is_trimmed_and_appended() {
        let st = AppState::fake();
        let post = create_post(&st, "alice", text_post("hello")).await.unwrap();

        add_comment(&st, post.id, "bob", "  first  ").await.unwrap();
        let updated = add_comment(&st, post.id, "carol", "second").await.unwrap().unwrap();

        assert_eq!(updated.comments.len(), 2);
        assert_eq!(updated.comments[0].username, "bob");
        assert_eq!(updated.comments[0].content, "first");
        assert_eq!(updated.comments[1].username, "carol");
    }

    #[tokio::test]
    async fn comment_on_unknown_post_is_not_found() {
        let st = AppState::fake();
        let err = add_comment(&st, Uuid::new_v4(), "bob", "hi").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn signup_login_post_and_like_flow() {
        let st = AppState::fake();
        signup(
            &st,
            SignupForm {
                username: "alice".into(),
                password: "pw1".into(),
                confirm_password: "pw1".into(),
            },
        )
        .await
        .unwrap();
        let user = login(
            &st,
            &LoginForm {
                username: "alice".into(),
                password: "pw1".into(),
            },
        )
        .await
        .unwrap();

        create_post(&st, &user.name, text_post("hello")).await.unwrap();
        let feed = list_feed(&st).await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].content, "hello");
        assert!(feed[0].likes.is_empty());
        assert_eq!(feed[0].likes_count, 0);

        let liked = toggle_like(&st, feed[0].id, "bob").await.unwrap();
        assert_eq!(liked.likes, vec!["bob".to_string()]);
        assert_eq!(liked.likes_count, 1);

        let unliked = toggle_like(&st, feed[0].id, "bob").await.unwrap();
        assert!(unliked.likes.is_empty());
        assert_eq!(unliked.likes_count, 0);
    }
}
