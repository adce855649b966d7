// Ticketline Infrastructure - SQLite Adapter
// Implements: DispatchStore (transactional dispatch), QueueRepository, CatalogRepository

mod connection;
mod error;
mod migration;
mod rows;
mod store;
mod transaction;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use store::SqliteQueueStore;
pub use transaction::SqliteDispatchTransaction;
