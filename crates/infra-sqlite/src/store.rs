// SQLite Queue Store - DispatchStore, QueueRepository and CatalogRepository

use crate::error::{map_sqlx_error, map_unique_violation};
use crate::rows::{into_tickets, CallHistoryRow, CounterRow, QueueTypeRow, TicketRow};
use crate::transaction::SqliteDispatchTransaction;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use ticketline_core::domain::{
    CallHistoryEntry, Counter, CounterId, NewQueueType, QueueType, QueueTypeId, Ticket, TicketId,
    TicketStatus,
};
use ticketline_core::error::{AppError, Result};
use ticketline_core::port::{
    CatalogRepository, DispatchStore, DispatchTransaction, QueueRepository, QueueStats,
    TicketFilter,
};
use tracing::info;

pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchStore for SqliteQueueStore {
    async fn begin(&self) -> Result<Box<dyn DispatchTransaction>> {
        // Take the write lock up front so read-then-claim cannot interleave
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteDispatchTransaction::new(tx)))
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueStore {
    async fn find_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(TicketRow::into_ticket).transpose()
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        // LIMIT -1 means no limit in SQLite
        let limit = filter.limit.map_or(-1, i64::from);

        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT * FROM tickets
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR queue_type = ?2)
              AND (?3 IS NULL OR issued_on = ?3)
            ORDER BY created_at DESC, id DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.queue_type.as_deref())
        .bind(filter.issued_on)
        .bind(limit)
        .bind(i64::from(filter.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        into_tickets(rows)
    }

    async fn waiting_count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE status = ?")
            .bind(TicketStatus::Waiting.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn waiting_count_by_type(&self) -> Result<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT queue_type, COUNT(*) FROM tickets WHERE status = ? GROUP BY queue_type",
        )
        .bind(TicketStatus::Waiting.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().collect())
    }

    async fn daily_stats(&self, issued_on: i64) -> Result<QueueStats> {
        let (total, waiting, called, completed, cancelled): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(status = 'waiting'), 0),
                    COALESCE(SUM(status = 'called'), 0),
                    COALESCE(SUM(status = 'completed'), 0),
                    COALESCE(SUM(status = 'cancelled'), 0)
                FROM tickets
                WHERE issued_on = ?
                "#,
            )
            .bind(issued_on)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let active_counters: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM counters WHERE active = 1")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(QueueStats {
            total,
            waiting,
            called,
            completed,
            cancelled,
            active_counters,
        })
    }

    async fn call_history(&self, limit: u32) -> Result<Vec<CallHistoryEntry>> {
        let rows = sqlx::query_as::<_, CallHistoryRow>(
            "SELECT * FROM call_history ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CallHistoryRow::into_entry).collect()
    }
}

#[async_trait]
impl CatalogRepository for SqliteQueueStore {
    async fn create_queue_type(&self, new: &NewQueueType, created_at: i64) -> Result<QueueType> {
        let row = sqlx::query_as::<_, QueueTypeRow>(
            r#"
            INSERT INTO queue_types (code, name, prefix, active, sort_order, created_at)
            VALUES (?, ?, ?, 1, (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM queue_types), ?)
            RETURNING *
            "#,
        )
        .bind(new.code.trim())
        .bind(new.name.trim())
        .bind(&new.prefix)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &format!("Queue type {}", new.code.trim())))?;

        let queue_type = QueueType::from(row);
        info!(code = %queue_type.code, prefix = %queue_type.prefix, "Queue type created");
        Ok(queue_type)
    }

    async fn find_queue_type(&self, code: &str) -> Result<Option<QueueType>> {
        let row = sqlx::query_as::<_, QueueTypeRow>("SELECT * FROM queue_types WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(QueueType::from))
    }

    async fn list_queue_types(&self, active_only: bool) -> Result<Vec<QueueType>> {
        let rows = sqlx::query_as::<_, QueueTypeRow>(
            "SELECT * FROM queue_types WHERE (?1 = 0 OR active = 1) ORDER BY sort_order, id",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(QueueType::from).collect())
    }

    async fn update_queue_type(&self, queue_type: &QueueType) -> Result<()> {
        let result = sqlx::query(
            "UPDATE queue_types SET name = ?, prefix = ?, active = ?, sort_order = ? WHERE id = ?",
        )
        .bind(&queue_type.name)
        .bind(&queue_type.prefix)
        .bind(queue_type.active)
        .bind(queue_type.sort_order)
        .bind(queue_type.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Queue type {} not found",
                queue_type.id
            )));
        }
        Ok(())
    }

    async fn delete_queue_type(&self, id: QueueTypeId) -> Result<()> {
        let result = sqlx::query("DELETE FROM queue_types WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Queue type {} not found", id)));
        }
        Ok(())
    }

    async fn create_counter(&self, number: &str, name: &str) -> Result<Counter> {
        let row = sqlx::query_as::<_, CounterRow>(
            "INSERT INTO counters (number, name, active) VALUES (?, ?, 1) RETURNING *",
        )
        .bind(number)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &format!("Counter {}", number)))?;

        let counter = Counter::from(row);
        info!(counter_id = counter.id, number = %counter.number, "Counter created");
        Ok(counter)
    }

    async fn find_counter(&self, id: CounterId) -> Result<Option<Counter>> {
        let row = sqlx::query_as::<_, CounterRow>("SELECT * FROM counters WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Counter::from))
    }

    async fn list_counters(&self) -> Result<Vec<Counter>> {
        let rows = sqlx::query_as::<_, CounterRow>("SELECT * FROM counters ORDER BY number, id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Counter::from).collect())
    }

    async fn update_counter(&self, id: CounterId, name: &str, active: bool) -> Result<Counter> {
        let row = sqlx::query_as::<_, CounterRow>(
            "UPDATE counters SET name = ?, active = ? WHERE id = ? RETURNING *",
        )
        .bind(name)
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Counter::from)
            .ok_or_else(|| AppError::NotFound(format!("Counter {} not found", id)))
    }

    async fn delete_counter(&self, id: CounterId) -> Result<()> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(map_sqlx_error)?;

        let held: Option<Option<i64>> =
            sqlx::query_scalar("SELECT current_ticket_id FROM counters WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        match held {
            None => return Err(AppError::NotFound(format!("Counter {} not found", id))),
            Some(Some(ticket_id)) => {
                return Err(AppError::Conflict(format!(
                    "Counter {} still holds ticket {}",
                    id, ticket_id
                )))
            }
            Some(None) => {}
        }

        sqlx::query("UPDATE tickets SET counter_id = NULL WHERE counter_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM call_history WHERE counter_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("DELETE FROM counters WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        info!(counter_id = id, "Counter deleted");
        Ok(())
    }
}
