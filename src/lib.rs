pub mod api;
pub mod config;
pub mod consumer;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use consumer::{ConsumerStats, EventConsumer};
pub use db::{create_pool, MemoryTransactionStore, PgTransactionStore, TransactionStore};
pub use service::{ExchangeRateHostLookup, IngestionProcessor, RateLookup, StatementAssembler};
