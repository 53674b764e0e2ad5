use axum::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{ProfileUpdate, User};
use crate::error::{AppError, Result};

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Find a user by name.
    async fn find_by_name(&self, name: &str) -> Result<Option<User>>;

    /// Insert a new user. A taken name yields `AppError::Conflict`.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Overwrite the profile fields of `name`, returning the updated user.
    async fn update_profile(&self, name: &str, update: &ProfileUpdate) -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password, email, bio, education, gender, age,
                   certifications, profile_image, created_at
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, password, email, bio, education, gender, age,
                               certifications, profile_image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password)
        .bind(&user.email)
        .bind(&user.bio)
        .bind(&user.education)
        .bind(&user.gender)
        .bind(user.age)
        .bind(&user.certifications)
        .bind(&user.profile_image)
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .map_err(AppError::from_user_insert)?;
        Ok(())
    }

    async fn update_profile(&self, name: &str, update: &ProfileUpdate) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email = $2,
                   bio = $3,
                   education = $4,
                   gender = $5,
                   age = $6,
                   certifications = $7,
                   profile_image = COALESCE($8, profile_image)
             WHERE name = $1
            RETURNING id, name, password, email, bio, education, gender, age,
                      certifications, profile_image, created_at
            "#,
        )
        .bind(name)
        .bind(&update.email)
        .bind(&update.bio)
        .bind(&update.education)
        .bind(&update.gender)
        .bind(update.age)
        .bind(&update.certifications)
        .bind(update.profile_image.as_deref())
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
