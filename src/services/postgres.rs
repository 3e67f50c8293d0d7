use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Sender id used for system-authored introduction messages
pub const ASSISTANT_SENDER: &str = "assistant";

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Outcome of opening a conversation between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedConversation {
    pub id: Uuid,
    pub is_new: bool,
}

/// PostgreSQL store for one-to-one conversations
///
/// A conversation is keyed by its unordered pair of participants; the
/// migration enforces this with a unique index on
/// `(LEAST(user1_id, user2_id), GREATEST(user1_id, user2_id))`.
pub struct ConversationStore {
    pool: PgPool,
}

impl ConversationStore {
    /// Connect, then run the embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, PostgresError> {
        let pool = pool_options(
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
        )
        .connect(database_url)
        .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            acquire_timeout_secs.unwrap_or(5),
            idle_timeout_secs.unwrap_or(600),
        )
        .await
    }

    /// Pool that connects on first use; migrations are not run
    pub fn lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = pool_options(5, 0, 5, 600).connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Existing conversation between two users, in either direction
    pub async fn find_conversation(
        &self,
        user_id: &str,
        other_id: &str,
    ) -> Result<Option<Uuid>, PostgresError> {
        let query = r#"
            SELECT id
            FROM conversations
            WHERE LEAST(user1_id, user2_id) = LEAST($1, $2)
              AND GREATEST(user1_id, user2_id) = GREATEST($1, $2)
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .bind(other_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("id")))
    }

    /// Reuse the pair's conversation or create one with an intro message
    ///
    /// Creation runs in one transaction. A concurrent create for the same
    /// pair loses on the unique index and returns the winner's id.
    pub async fn open_conversation(
        &self,
        user_id: &str,
        target_id: &str,
        intro: &str,
    ) -> Result<OpenedConversation, PostgresError> {
        if user_id.is_empty() || target_id.is_empty() {
            return Err(PostgresError::InvalidInput(
                "both participants are required".to_string(),
            ));
        }
        if user_id == target_id {
            return Err(PostgresError::InvalidInput(
                "cannot open a conversation with yourself".to_string(),
            ));
        }

        if let Some(id) = self.find_conversation(user_id, target_id).await? {
            tracing::debug!("Reusing conversation {} for {} -> {}", id, user_id, target_id);
            return Ok(OpenedConversation { id, is_new: false });
        }

        let mut tx = self.pool.begin().await?;
        let id = Uuid::new_v4();

        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations (id, user1_id, user2_id, created_at, last_message_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT ((LEAST(user1_id, user2_id)), (GREATEST(user1_id, user2_id)))
            DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            let existing = self
                .find_conversation(user_id, target_id)
                .await?
                .ok_or_else(|| {
                    PostgresError::NotFound(format!(
                        "conversation for {} and {}",
                        user_id, target_id
                    ))
                })?;
            return Ok(OpenedConversation {
                id: existing,
                is_new: false,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(ASSISTANT_SENDER)
        .bind(intro)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Opened conversation {} for {} -> {}", id, user_id, target_id);

        Ok(OpenedConversation { id, is_new: true })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn pool_options(
    max_connections: u32,
    min_connections: u32,
    acquire_timeout_secs: u64,
    idle_timeout_secs: u64,
) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(idle_timeout_secs))
        .test_before_acquire(true)
}
