// Ticket Sequencer - assigns the next human-readable number per prefix and day

use crate::application::constants::{
    DEFAULT_NUMBER_WIDTH, DEFAULT_PREFIX, DEFAULT_QUEUE_TYPE, DEFAULT_START_NUMBER,
};
use crate::domain::{format_ticket_number, NewTicket, Ticket};
use crate::error::{AppError, Result};
use crate::port::time_provider::local_day_start;
use crate::port::{DispatchStore, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Numbering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Queue type used when a request names none
    pub default_queue_type: String,
    /// Prefix used when the queue type is unknown
    pub default_prefix: String,
    /// First sequence number when nothing was issued yet
    pub start_number: u32,
    /// Zero-padded width of the numeric part
    pub number_width: usize,
    /// Restart numbering every day
    pub reset_daily: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            default_queue_type: DEFAULT_QUEUE_TYPE.to_string(),
            default_prefix: DEFAULT_PREFIX.to_string(),
            start_number: DEFAULT_START_NUMBER,
            number_width: DEFAULT_NUMBER_WIDTH,
            reset_daily: true,
        }
    }
}

/// Ticket Sequencer
pub struct TicketSequencer {
    store: Arc<dyn DispatchStore>,
    time_provider: Arc<dyn TimeProvider>,
    config: SequencerConfig,
}

impl TicketSequencer {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        time_provider: Arc<dyn TimeProvider>,
        config: SequencerConfig,
    ) -> Self {
        Self {
            store,
            time_provider,
            config,
        }
    }

    /// Issue a new waiting ticket
    ///
    /// "Read max, then insert" runs in one transaction, so concurrent
    /// callers for the same prefix never receive the same number.
    pub async fn create_ticket(&self, queue_type: Option<&str>) -> Result<Ticket> {
        let code = match queue_type.map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => self.config.default_queue_type.clone(),
        };

        let mut tx = self.store.begin().await?;

        let prefix = match tx.find_queue_type(&code).await? {
            Some(qt) => qt.prefix,
            None => {
                debug!(queue_type = %code, prefix = %self.config.default_prefix, "Unknown queue type, using default prefix");
                self.config.default_prefix.clone()
            }
        };

        let now = self.time_provider.now_millis();
        let issued_on = local_day_start(now);
        let scope_day = self.config.reset_daily.then_some(issued_on);

        let last = match tx.max_sequence(&prefix, scope_day).await? {
            Some(last) => last,
            None => self.config.start_number.saturating_sub(1),
        };
        let sequence = last.checked_add(1).ok_or_else(|| {
            AppError::InvalidState(format!("ticket sequence exhausted for prefix {}", prefix))
        })?;

        let new_ticket = NewTicket {
            number: format_ticket_number(&prefix, sequence, self.config.number_width),
            queue_type: code,
            prefix,
            sequence,
            issued_on,
            created_at: now,
        };

        let ticket = tx.insert_ticket(&new_ticket).await?;
        tx.commit().await?;

        info!(
            ticket_id = ticket.id,
            ticket = %ticket.number,
            queue_type = %ticket.queue_type,
            "Ticket issued"
        );

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_reference_numbering() {
        let config = SequencerConfig::default();
        assert_eq!(config.default_queue_type, "general");
        assert_eq!(config.default_prefix, "A");
        assert_eq!(config.start_number, 1);
        assert_eq!(config.number_width, 3);
        assert!(config.reset_daily);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SequencerConfig =
            serde_json::from_value(serde_json::json!({"number_width": 4})).unwrap();
        assert_eq!(config.number_width, 4);
        assert_eq!(config.default_prefix, "A");
    }
}
