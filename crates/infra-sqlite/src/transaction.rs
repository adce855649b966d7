// SQLite Dispatch Transaction

use crate::error::map_sqlx_error;
use crate::rows::{into_tickets, CounterRow, QueueTypeRow, TicketRow};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction as SqlxTransaction};
use ticketline_core::domain::{
    CallAction, Counter, CounterId, NewTicket, QueueType, Ticket, TicketId, TicketStatus,
};
use ticketline_core::error::{AppError, Result};
use ticketline_core::port::{DispatchTransaction, TicketScope, Transaction};

/// Tickets addressed by a [`TicketScope`]; binds `?1` = issued_on, `?2` = queue_type
const SCOPE_FILTER: &str = "(?1 IS NULL OR issued_on = ?1) AND (?2 IS NULL OR queue_type = ?2)";

/// Write transaction opened with `BEGIN IMMEDIATE`
pub struct SqliteDispatchTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
}

impl SqliteDispatchTransaction {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    async fn execute_scoped(&mut self, sql: &str, scope: &TicketScope) -> Result<u64> {
        let result = sqlx::query(sql)
            .bind(scope.issued_on)
            .bind(scope.queue_type.as_deref())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Transaction for SqliteDispatchTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl DispatchTransaction for SqliteDispatchTransaction {
    async fn find_queue_type(&mut self, code: &str) -> Result<Option<QueueType>> {
        let row = sqlx::query_as::<_, QueueTypeRow>("SELECT * FROM queue_types WHERE code = ?")
            .bind(code)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(QueueType::from))
    }

    async fn max_sequence(&mut self, prefix: &str, issued_on: Option<i64>) -> Result<Option<u32>> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(sequence) FROM tickets WHERE prefix = ?1 AND (?2 IS NULL OR issued_on = ?2)",
        )
        .bind(prefix)
        .bind(issued_on)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        max.map(|value| {
            u32::try_from(value)
                .map_err(|_| AppError::Database(format!("Corrupt ticket sequence {}", value)))
        })
        .transpose()
    }

    async fn insert_ticket(&mut self, ticket: &NewTicket) -> Result<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            INSERT INTO tickets (number, queue_type, prefix, sequence, issued_on, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&ticket.number)
        .bind(&ticket.queue_type)
        .bind(&ticket.prefix)
        .bind(i64::from(ticket.sequence))
        .bind(ticket.issued_on)
        .bind(TicketStatus::Waiting.as_str())
        .bind(ticket.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.into_ticket()
    }

    async fn find_counter(&mut self, id: CounterId) -> Result<Option<Counter>> {
        let row = sqlx::query_as::<_, CounterRow>("SELECT * FROM counters WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Counter::from))
    }

    async fn find_ticket(&mut self, id: TicketId) -> Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(TicketRow::into_ticket).transpose()
    }

    async fn oldest_waiting(&mut self, queue_type: Option<&str>) -> Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT * FROM tickets
            WHERE status = ?1 AND (?2 IS NULL OR queue_type = ?2)
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(TicketStatus::Waiting.as_str())
        .bind(queue_type)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TicketRow::into_ticket).transpose()
    }

    async fn save_ticket(&mut self, ticket: &Ticket, expected: TicketStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET status = ?, counter_id = ?, called_at = ?, completed_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(ticket.status.as_str())
        .bind(ticket.counter_id)
        .bind(ticket.called_at)
        .bind(ticket.completed_at)
        .bind(ticket.id)
        .bind(expected.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "ticket {} is no longer {}",
                ticket.number, expected
            )));
        }
        Ok(())
    }

    async fn save_counter(&mut self, counter: &Counter) -> Result<()> {
        let result = sqlx::query(
            "UPDATE counters SET current_ticket_id = ?, last_call_at = ? WHERE id = ?",
        )
        .bind(counter.current_ticket)
        .bind(counter.last_call_at)
        .bind(counter.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Counter {} not found", counter.id)));
        }
        Ok(())
    }

    async fn append_history(
        &mut self,
        ticket_id: TicketId,
        counter_id: CounterId,
        action: CallAction,
        at: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO call_history (ticket_id, counter_id, action, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(ticket_id)
        .bind(counter_id)
        .bind(action.as_str())
        .bind(at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn stale_waiting(&mut self, created_before: i64) -> Result<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT * FROM tickets
            WHERE status = ? AND created_at < ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(TicketStatus::Waiting.as_str())
        .bind(created_before)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        into_tickets(rows)
    }

    async fn release_counters(&mut self, scope: &TicketScope) -> Result<u64> {
        let sql = format!(
            "UPDATE counters SET current_ticket_id = NULL, last_call_at = NULL \
             WHERE current_ticket_id IN (SELECT id FROM tickets WHERE {})",
            SCOPE_FILTER
        );
        self.execute_scoped(&sql, scope).await
    }

    async fn delete_history(&mut self, scope: &TicketScope) -> Result<u64> {
        let sql = format!(
            "DELETE FROM call_history WHERE ticket_id IN (SELECT id FROM tickets WHERE {})",
            SCOPE_FILTER
        );
        self.execute_scoped(&sql, scope).await
    }

    async fn delete_tickets(&mut self, scope: &TicketScope) -> Result<u64> {
        let sql = format!("DELETE FROM tickets WHERE {}", SCOPE_FILTER);
        self.execute_scoped(&sql, scope).await
    }
}
