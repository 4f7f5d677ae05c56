pub mod event;
pub mod page;
pub mod rate;
pub mod statement;
pub mod transaction;

pub use event::InboundEvent;
pub use page::{Page, PageRequest};
pub use rate::RateResponse;
pub use statement::{StatementLine, StatementPage};
pub use transaction::{Direction, ParsedAmount, StoredTransaction, TransactionRow};
