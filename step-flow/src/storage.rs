use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::sync::Arc;
use uuid::Uuid;

use crate::{Context, error::Result};

/// One wizard run: the cursor plus the shared context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub wizard_id: String,
    pub current_step_id: String,
    /// Last message produced by a step, surfaced to the client.
    pub status_message: Option<String>,
    #[serde(skip)]
    pub context: Context,
}

impl Session {
    /// Create a fresh session positioned on the given step.
    pub fn new_from_step(sid: String, step_id: &str) -> Self {
        Self {
            id: sid,
            wizard_id: "default".to_string(),
            current_step_id: step_id.to_string(),
            status_message: None,
            context: Context::new(),
        }
    }

    pub fn with_generated_id(step_id: &str) -> Self {
        Self::new_from_step(Uuid::new_v4().to_string(), step_id)
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of SessionStorage
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

/// PostgreSQL-backed SessionStorage. The context is persisted as JSONB so a
/// wizard can resume across service restarts.
pub struct PostgresSessionStorage {
    pool: PgPool,
}

impl PostgresSessionStorage {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wizard_sessions (
                id TEXT PRIMARY KEY,
                wizard_id TEXT NOT NULL,
                current_step_id TEXT NOT NULL,
                status_message TEXT,
                context JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStorage for PostgresSessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wizard_sessions (id, wizard_id, current_step_id, status_message, context, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                wizard_id = EXCLUDED.wizard_id,
                current_step_id = EXCLUDED.current_step_id,
                status_message = EXCLUDED.status_message,
                context = EXCLUDED.context,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&session.id)
        .bind(&session.wizard_id)
        .bind(&session.current_step_id)
        .bind(&session.status_message)
        .bind(session.context.to_json())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, wizard_id, current_step_id, status_message, context
            FROM wizard_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Session {
            id: row.get("id"),
            wizard_id: row.get("wizard_id"),
            current_step_id: row.get("current_step_id"),
            status_message: row.get("status_message"),
            context: Context::from_json(row.get("context")),
        }))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM wizard_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
