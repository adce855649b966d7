// Application constants (no magic values)
use std::time::Duration;

/// Default queue type code used when a ticket request names none
pub const DEFAULT_QUEUE_TYPE: &str = "general";

/// Prefix used when the requested queue type is unknown
pub const DEFAULT_PREFIX: &str = "A";

/// First sequence number of a fresh day
pub const DEFAULT_START_NUMBER: u32 = 1;

/// Zero-padded width of the numeric part of a ticket number (A001)
pub const DEFAULT_NUMBER_WIDTH: usize = 3;

/// Per-subscriber mailbox capacity; events beyond this are dropped
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// Keep-alive period of a stream session
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// How often the stale-ticket sweep runs
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Waiting tickets older than this are cancelled by the sweep
pub const DEFAULT_STALE_TICKET_AGE: Duration = Duration::from_secs(24 * 60 * 60);
