use async_trait::async_trait;
use marquee_core::identity::UserProfile;
use marquee_core::repository::UserDirectory;
use marquee_core::CoreResult;
use marquee_shared::Redacted;
use sqlx::PgPool;

use crate::storage_error;

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i32,
    name: String,
    email: String,
    is_admin: bool,
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user(&self, user_id: i32) -> CoreResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, name, email, is_admin FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(|row| UserProfile {
            user_id: row.user_id,
            name: row.name,
            email: Redacted::new(row.email),
            is_admin: row.is_admin,
        }))
    }
}
