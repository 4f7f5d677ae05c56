use std::sync::Arc;
use tracing::{debug, error, info};

use super::amount::{month_key, parse_currency_amount};
use crate::db::TransactionStore;
use crate::error::IngestError;
use crate::models::{InboundEvent, StoredTransaction};

/// 将入账事件转换为存储的交易
pub struct IngestionProcessor {
    store: Arc<dyn TransactionStore>,
}

impl IngestionProcessor {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// 解码一条 JSON 消息并入账
    pub async fn ingest_message(&self, message: &str) -> Result<StoredTransaction, IngestError> {
        let preview: String = message.chars().take(100).collect();
        info!("Received transaction message: payload={}", preview);

        let event: InboundEvent = serde_json::from_str(message).map_err(|e| {
            error!("Failed to decode transaction message: {}: {}", e, message);
            IngestError::InvalidPayload(e)
        })?;

        self.ingest(event).await
    }

    /// 解析金额, 计算月份键, 按事件 id 插入或覆盖
    /// 同一 id 重投会覆盖之前的记录
    pub async fn ingest(&self, event: InboundEvent) -> Result<StoredTransaction, IngestError> {
        let id = event.id;
        debug!(
            "Ingesting transaction: id={}, customer={}, amount={}",
            id, event.customer_id, event.currency_amount
        );

        // 1. 解析金额
        let parsed = parse_currency_amount(event.currency_amount.trim()).map_err(|source| {
            error!("Failed to ingest transaction: id={}: {}", id, source);
            IngestError::MalformedAmount { id, source }
        })?;
        debug!(
            "Parsed currency amount: {} {} {}",
            parsed.currency, parsed.magnitude, parsed.direction
        );

        // 2. 构建记录
        let transaction = StoredTransaction {
            id,
            customer_id: event.customer_id,
            account_iban: event.account_iban,
            currency: parsed.currency,
            amount: parsed.magnitude,
            transaction_type: parsed.direction,
            value_date: event.value_date,
            month_key: month_key(event.value_date),
            description: event.description,
            created_at: None,
            updated_at: None,
        };

        // 3. 插入或覆盖
        let saved = self.store.upsert(transaction).await.map_err(|source| {
            error!("Failed to ingest transaction: id={}: {}", id, source);
            IngestError::Persistence { id, source }
        })?;

        info!(
            "Saved transaction: id={}, customer={}, type={}, amount={} {}",
            saved.id, saved.customer_id, saved.transaction_type, saved.amount, saved.currency
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTransactionStore;
    use crate::error::AmountError;
    use crate::models::Direction;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn event(id: Uuid, amount: &str, value_date: NaiveDate) -> InboundEvent {
        InboundEvent {
            id,
            customer_id: "123".to_string(),
            account_iban: "CH93-0000-0000-0000-0000-0".to_string(),
            currency_amount: amount.to_string(),
            value_date,
            description: "Online payment CHF".to_string(),
        }
    }

    fn setup() -> (Arc<MemoryTransactionStore>, IngestionProcessor) {
        let store = Arc::new(MemoryTransactionStore::new());
        let processor = IngestionProcessor::new(store.clone());
        (store, processor)
    }

    #[tokio::test]
    async fn test_ingest_stores_parsed_debit_with_month_key() {
        let (store, processor) = setup();
        let id = Uuid::new_v4();
        let value_date = NaiveDate::from_ymd_opt(2020, 10, 17).unwrap();

        processor.ingest(event(id, " CHF 100- ", value_date)).await.unwrap();

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.currency, "CHF");
        assert_eq!(stored.amount, BigDecimal::from(100));
        assert_eq!(stored.transaction_type, Direction::Debit);
        assert_eq!(stored.month_key, NaiveDate::from_ymd_opt(2020, 10, 1).unwrap());
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn test_redelivery_overwrites_instead_of_duplicating() {
        let (store, processor) = setup();
        let id = Uuid::new_v4();
        let value_date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        processor.ingest(event(id, "EUR 10", value_date)).await.unwrap();
        processor.ingest(event(id, "EUR 25.50-", value_date)).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.amount, "25.50".parse::<BigDecimal>().unwrap());
        assert_eq!(stored.transaction_type, Direction::Debit);
    }

    #[tokio::test]
    async fn test_malformed_amount_is_surfaced_and_nothing_is_written() {
        let (store, processor) = setup();
        let value_date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let err = processor.ingest(event(Uuid::new_v4(), "EUR100", value_date)).await.unwrap_err();

        assert!(matches!(
            err,
            IngestError::MalformedAmount { source: AmountError::MissingSeparator(_), .. }
        ));
        assert!(!err.is_retryable());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_message_decodes_camel_case_json() {
        let (store, processor) = setup();
        let message = r#"{
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "customerId": "123",
            "accountIban": "CH93-0000-0000-0000-0000-0",
            "currencyAmount": "GBP 42.10",
            "valueDate": "2024-03-09",
            "description": "Salary"
        }"#;

        let saved = processor.ingest_message(message).await.unwrap();

        assert_eq!(saved.transaction_type, Direction::Credit);
        assert_eq!(saved.month_key, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_is_not_retryable() {
        let (_store, processor) = setup();
        let err = processor.ingest_message("{not json").await.unwrap_err();

        assert!(matches!(err, IngestError::InvalidPayload(_)));
        assert!(!err.is_retryable());
    }
}
