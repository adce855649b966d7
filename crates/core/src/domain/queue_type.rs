// Queue Type Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

pub type QueueTypeId = i64;

/// Partitions the FIFO and the numbering sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueType {
    pub id: QueueTypeId,
    /// Stable identifier used by tickets and dispatch filters
    pub code: String,
    pub name: String,
    pub prefix: String,
    pub active: bool,
    pub sort_order: i32,
    pub created_at: i64,
}

/// Fields accepted when registering a queue type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQueueType {
    pub code: String,
    pub name: String,
    pub prefix: String,
}

impl NewQueueType {
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "queue type code cannot be empty".to_string(),
            ));
        }
        validate_prefix(&self.prefix)
    }
}

/// Partial edit of a queue type; `None` keeps the current value
///
/// The code is the stable key and cannot change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueTypeUpdate {
    pub name: Option<String>,
    pub prefix: Option<String>,
    pub active: Option<bool>,
    pub sort_order: Option<i32>,
}

impl QueueTypeUpdate {
    pub fn apply_to(self, queue_type: &mut QueueType) -> Result<()> {
        if let Some(prefix) = &self.prefix {
            validate_prefix(prefix)?;
        }
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::ValidationError(
                    "queue type name cannot be empty".to_string(),
                ));
            }
            queue_type.name = name.to_string();
        }
        if let Some(prefix) = self.prefix {
            queue_type.prefix = prefix;
        }
        if let Some(active) = self.active {
            queue_type.active = active;
        }
        if let Some(sort_order) = self.sort_order {
            queue_type.sort_order = sort_order;
        }
        Ok(())
    }
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() || prefix.len() > 4 {
        return Err(DomainError::ValidationError(format!(
            "queue type prefix must be 1-4 characters, got {:?}",
            prefix
        )));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::ValidationError(format!(
            "queue type prefix must be letters only, got {:?}",
            prefix
        )));
    }
    Ok(())
}
