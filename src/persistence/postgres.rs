//! PostgreSQL implementation of the event store.
//!
//! Each class is one row of the `classes` table; the subscriber set is a
//! `TEXT[]` column. Subscriber changes are single `UPDATE` statements so the
//! row lock makes them atomic against concurrent requests on the same URI.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::{mpsc, oneshot};

use super::models::{CLASS_COLUMNS, ClassRow, into_event};
use super::{EventStore, EventStream, receiver_stream};
use crate::config::MonitorConfig;
use crate::domain::{ClassDetails, ClassStatus, ClassUri, Event, UserId};
use crate::error::NotifyError;

/// PostgreSQL-backed event store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the database settings in `config` and applies the
    /// embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Persist`] if the database is unreachable or a
    /// migration fails.
    pub async fn connect(config: &MonitorConfig) -> Result<Self, NotifyError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| NotifyError::Persist(format!("connecting to database: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| NotifyError::Persist(format!("running migrations: {e}")))?;

        tracing::info!("connected to class store");
        Ok(Self::new(pool))
    }

    async fn exists(&self, uri: &ClassUri) -> Result<bool, NotifyError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM classes WHERE uri = $1)")
            .bind(uri.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(query_err)
    }
}

fn is_decode_error(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_))
}

fn query_err(e: sqlx::Error) -> NotifyError {
    NotifyError::Query(e.to_string())
}

fn persist_err(e: sqlx::Error) -> NotifyError {
    NotifyError::Persist(e.to_string())
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn count_active(&self) -> Result<usize, NotifyError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes WHERE status <> $1")
            .bind(ClassStatus::Completed.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(query_err)?;
        usize::try_from(count).map_err(|_| NotifyError::Query(format!("invalid count {count}")))
    }

    async fn stream_active(&self, capacity_hint: usize) -> Result<EventStream, NotifyError> {
        let pool = self.pool.clone();
        let (tx, rx) = mpsc::channel(capacity_hint.max(1));
        let (opened_tx, opened_rx) = oneshot::channel();

        tokio::spawn(async move {
            let sql = format!("SELECT {CLASS_COLUMNS} FROM classes WHERE status <> $1");
            let mut rows = sqlx::query_as::<_, ClassRow>(&sql)
                .bind(ClassStatus::Completed.as_str())
                .fetch(&pool);

            // The first pull opens the scan; only a row that fails to decode
            // is reported per item, anything else fails the call itself.
            let first = match rows.next().await {
                Some(Err(e)) if !is_decode_error(&e) => {
                    let _ = opened_tx.send(Err(query_err(e)));
                    return;
                }
                first => first,
            };
            if opened_tx.send(Ok(())).is_err() {
                return;
            }
            let Some(first) = first else {
                return;
            };
            if tx
                .send(first.map_err(query_err).and_then(into_event))
                .await
                .is_err()
            {
                return;
            }

            while let Some(row) = rows.next().await {
                let item = row.map_err(query_err).and_then(into_event);
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        opened_rx
            .await
            .map_err(|_| NotifyError::Query("active scan task ended early".to_string()))??;
        Ok(receiver_stream(rx))
    }

    async fn get_by_uri(&self, uri: &ClassUri) -> Result<Event, NotifyError> {
        let sql = format!("SELECT {CLASS_COLUMNS} FROM classes WHERE uri = $1");
        let row = sqlx::query_as::<_, ClassRow>(&sql)
            .bind(uri.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?
            .ok_or_else(|| NotifyError::NotFound(uri.clone()))?;
        into_event(row)
    }

    async fn get_by_subscriber(&self, user_id: &UserId) -> Result<Vec<Event>, NotifyError> {
        let sql =
            format!("SELECT {CLASS_COLUMNS} FROM classes WHERE $1 = ANY(subscribers) ORDER BY uri");
        let rows = sqlx::query_as::<_, ClassRow>(&sql)
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        rows.into_iter().map(into_event).collect()
    }

    async fn create(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
        first_subscriber: &UserId,
    ) -> Result<Event, NotifyError> {
        let event = Event::new(uri.clone(), details.clone(), first_subscriber.clone());

        let result = sqlx::query(
            "INSERT INTO classes (uri, subscribers, name, description, status, seats_total, \
             seats_remaining, waitlist_total, waitlist_remaining, created_at, checked_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(uri.as_str())
        .bind(vec![first_subscriber.to_string()])
        .bind(&details.name)
        .bind(&details.description)
        .bind(details.status.as_str())
        .bind(i64::from(details.seats_total))
        .bind(i64::from(details.seats_remaining))
        .bind(i64::from(details.waitlist_total))
        .bind(i64::from(details.waitlist_remaining))
        .bind(event.created_at)
        .bind(event.checked_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::info!(%uri, "created class event");
                Ok(event)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(NotifyError::Conflict(uri.clone()))
            }
            Err(e) => Err(persist_err(e)),
        }
    }

    async fn add_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError> {
        let result = sqlx::query(
            "UPDATE classes SET subscribers = CASE \
               WHEN $2 = ANY(subscribers) THEN subscribers \
               ELSE array_append(subscribers, $2) END \
             WHERE uri = $1",
        )
        .bind(uri.as_str())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(persist_err)?;

        if result.rows_affected() == 0 {
            return Err(NotifyError::NotFound(uri.clone()));
        }
        tracing::debug!(%uri, %user_id, "added subscriber");
        Ok(())
    }

    async fn remove_subscriber(&self, uri: &ClassUri, user_id: &UserId) -> Result<(), NotifyError> {
        let result = sqlx::query(
            "UPDATE classes SET subscribers = array_remove(subscribers, $2) \
             WHERE uri = $1 AND $2 = ANY(subscribers)",
        )
        .bind(uri.as_str())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(persist_err)?;

        if result.rows_affected() == 0 {
            if self.exists(uri).await? {
                return Err(NotifyError::Persist(format!(
                    "{user_id} is not subscribed to {uri}"
                )));
            }
            return Err(NotifyError::NotFound(uri.clone()));
        }
        tracing::debug!(%uri, %user_id, "removed subscriber");
        Ok(())
    }

    async fn update_details(
        &self,
        uri: &ClassUri,
        details: &ClassDetails,
    ) -> Result<(), NotifyError> {
        let result = sqlx::query(
            "UPDATE classes SET name = $2, description = $3, status = $4, seats_total = $5, \
             seats_remaining = $6, waitlist_total = $7, waitlist_remaining = $8, \
             checked_at = NOW() WHERE uri = $1",
        )
        .bind(uri.as_str())
        .bind(&details.name)
        .bind(&details.description)
        .bind(details.status.as_str())
        .bind(i64::from(details.seats_total))
        .bind(i64::from(details.seats_remaining))
        .bind(i64::from(details.waitlist_total))
        .bind(i64::from(details.waitlist_remaining))
        .execute(&self.pool)
        .await
        .map_err(persist_err)?;

        if result.rows_affected() == 0 {
            return Err(NotifyError::NotFound(uri.clone()));
        }
        Ok(())
    }

    async fn remove(&self, uri: &ClassUri) -> Result<(), NotifyError> {
        let result = sqlx::query("DELETE FROM classes WHERE uri = $1")
            .bind(uri.as_str())
            .execute(&self.pool)
            .await
            .map_err(persist_err)?;

        if result.rows_affected() == 0 {
            return Err(NotifyError::NotFound(uri.clone()));
        }
        tracing::info!(%uri, "removed class event");
        Ok(())
    }
}
