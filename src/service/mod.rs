pub mod amount;
pub mod fx_rate;
pub mod ingestion;
pub mod statement;

pub use amount::{month_key, parse_currency_amount};
pub use fx_rate::{ExchangeRateHostLookup, FixedRateLookup, RateLookup};
pub use ingestion::IngestionProcessor;
pub use statement::StatementAssembler;
