pub mod memory;
pub mod pool;
pub mod queries;
pub mod store;

pub use memory::MemoryTransactionStore;
pub use pool::create_pool;
pub use queries::ensure_schema;
pub use store::{PgTransactionStore, TransactionStore};
