use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use super::{CalculationStore, StoreError, UserStore};
use crate::config::Config;
use crate::history::fold_into;
use crate::models::{Calculation, NewCalculation, NewUser, User, UserUpdate};

const USER_COLUMNS: &str = "id, email, password, name, icon, phone, department, join_date, \
     last_login, calculations_count, favorite_operator, last_calculation, operator_tally";

const CALCULATION_COLUMNS: &str = "id, expression, operator, result, created_at, user_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and brings the schema up to date.
    pub async fn connect(database_url: &str, config: &Config) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET application_name = 'mycalc';").await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Database schema is up to date");

        Ok(Self::new(pool))
    }
}

/// Maps a unique-constraint violation on `users.email` to its domain error.
fn email_conflict(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::EmailAlreadyUsed,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password, name, icon, join_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password)
        .bind(&new.name)
        .bind(new.icon)
        .bind(new.join_date)
        .fetch_one(&self.pool)
        .await
        .map_err(email_conflict)?;

        tracing::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn update_user(
        &self,
        id: i64,
        update: UserUpdate,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                password = COALESCE($2, password),
                name = COALESCE($3, name)
            WHERE id = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(update.email)
        .bind(update.password)
        .bind(update.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(email_conflict)?;
        Ok(user)
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let done = sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_all_users(&self) -> Result<u64, StoreError> {
        let done = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        tracing::warn!("Deleted all {} users", done.rows_affected());
        Ok(done.rows_affected())
    }
}

#[async_trait]
impl CalculationStore for PgStore {
    async fn append(&self, new: NewCalculation) -> Result<Calculation, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the owner first so concurrent appends for one user serialize.
        // NOW() is the transaction start; stamp the row after the lock instead.
        let owner = match new.user_id {
            Some(id) => Some(
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
                ))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::UserNotFound(id))?,
            ),
            None => None,
        };

        let calculation = sqlx::query_as::<_, Calculation>(&format!(
            r#"
            INSERT INTO calculations (expression, operator, result, user_id, created_at)
            VALUES ($1, $2, $3, $4, clock_timestamp())
            RETURNING {CALCULATION_COLUMNS}
            "#
        ))
        .bind(&new.expression)
        .bind(&new.operator)
        .bind(&new.result)
        .bind(new.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(mut user) = owner {
            fold_into(&mut user, &calculation);
            sqlx::query(
                r#"
                UPDATE users
                SET calculations_count = $1,
                    favorite_operator = $2,
                    last_calculation = $3,
                    operator_tally = $4
                WHERE id = $5
                "#,
            )
            .bind(user.calculations_count)
            .bind(&user.favorite_operator)
            .bind(&user.last_calculation)
            .bind(&user.operator_tally)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(calculation)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Calculation>, StoreError> {
        let calculations = sqlx::query_as::<_, Calculation>(&format!(
            r#"
            SELECT {CALCULATION_COLUMNS}
            FROM calculations
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(calculations)
    }

    async fn list_all(&self) -> Result<Vec<Calculation>, StoreError> {
        let calculations = sqlx::query_as::<_, Calculation>(&format!(
            "SELECT {CALCULATION_COLUMNS} FROM calculations ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(calculations)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "needs a PostgreSQL database in DATABASE_URL"]
    async fn concurrent_appends_keep_history_order_and_aggregates_in_step() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let store = Arc::new(PgStore::connect(&url, &Config::default()).await.unwrap());
        let user = store
            .create_user(NewUser {
                email: format!("race-{}@example.com", Utc::now().timestamp_nanos_opt().unwrap()),
                password: "pw".to_string(),
                name: "Race".to_string(),
                icon: None,
                join_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            })
            .await
            .unwrap();

        let user_id = user.id;
        let mut tasks = Vec::new();
        for i in 0..40 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .append(NewCalculation {
                        expression: format!("{i} + 1"),
                        operator: "+".to_string(),
                        result: (i + 1).to_string(),
                        user_id: Some(user_id),
                    })
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = store.list_by_user(user.id).await.unwrap();
        let owner = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.len(), 40);
        assert_eq!(owner.calculations_count, 40);
        assert_eq!(owner.last_calculation, Some(stored[0].summary()));
        assert!(stored.windows(2).all(|w| w[0].id > w[1].id));

        store.delete_user(user.id).await.unwrap();
    }
}
