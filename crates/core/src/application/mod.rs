// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod hub;
pub mod sequencer;
pub mod session;
pub mod shutdown;
pub mod sweeper;

// Re-exports
pub use dispatch::{CallNextOutcome, CounterOutcome, DispatchService};
pub use engine::{QueueEngine, TodayStats};
pub use hub::{
    DeliveryReport, HubConfig, NotificationHub, SubscriberId, Subscription, SubscriptionTarget,
};
pub use sequencer::{SequencerConfig, TicketSequencer};
pub use session::{SessionEnd, StreamSession};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use sweeper::{StaleTicketSweeper, SweepConfig};
