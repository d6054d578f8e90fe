use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use super::UserStore;
use crate::models::users::{UserLedger, UserLedgerRow};

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_user(&self, id: &str) -> Result<Option<UserLedger>, anyhow::Error> {
        let row = sqlx::query_as::<_, UserLedgerRow>(
            r#"
                SELECT id, points, checked_in_places, place_check_ins, rewards, points_history, push_token
                FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(row.map(UserLedger::from))
    }

    async fn save_user(&self, user: &UserLedger) -> Result<(), anyhow::Error> {
        let result = sqlx::query(
            r#"
                UPDATE users SET
                    points = $2,
                    checked_in_places = $3,
                    place_check_ins = $4,
                    rewards = $5,
                    points_history = $6,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
            "#,
        )
        .bind(&user.id)
        .bind(user.points)
        .bind(&user.checked_in_places)
        .bind(Json(&user.place_check_ins))
        .bind(&user.rewards)
        .bind(Json(&user.points_history))
        .execute(&self.conn)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("User not found: {}", user.id);
        }

        Ok(())
    }
}
