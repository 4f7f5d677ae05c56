use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::TransactionStore;
use crate::error::StoreError;
use crate::models::{Page, PageRequest, StoredTransaction};

/// 进程内存储, 语义与 Postgres 存储一致
#[derive(Default, Clone)]
pub struct MemoryTransactionStore {
    rows: Arc<DashMap<Uuid, StoredTransaction>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn upsert(&self, mut tx: StoredTransaction) -> Result<StoredTransaction, StoreError> {
        let now = Utc::now();
        let mut entry = self.rows.entry(tx.id).or_insert_with(|| tx.clone());

        // 覆盖时保留首次写入的创建时间
        tx.created_at = entry.created_at;
        tx.stamp_for_write(now);
        *entry = tx.clone();

        Ok(tx)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredTransaction>, StoreError> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn find_page(
        &self,
        customer_id: &str,
        month_key: NaiveDate,
        request: PageRequest,
    ) -> Result<Page<StoredTransaction>, StoreError> {
        let mut matching: Vec<StoredTransaction> = self
            .rows
            .iter()
            .filter(|r| r.customer_id == customer_id && r.month_key == month_key)
            .map(|r| r.value().clone())
            .collect();

        matching.sort_by(|a, b| a.value_date.cmp(&b.value_date).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();

        Ok(Page::new(items, request, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use bigdecimal::BigDecimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn transaction(id: Uuid, customer: &str, value_date: NaiveDate, amount: i64) -> StoredTransaction {
        StoredTransaction {
            id,
            customer_id: customer.to_string(),
            account_iban: "CH93-0000-0000-0000-0000-0".to_string(),
            currency: "CHF".to_string(),
            amount: BigDecimal::from(amount),
            transaction_type: Direction::Credit,
            value_date,
            month_key: crate::service::month_key(value_date),
            description: "test".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_stamps_audit_timestamps() {
        let store = MemoryTransactionStore::new();
        let saved = store
            .upsert(transaction(Uuid::new_v4(), "123", date(2024, 1, 5), 10))
            .await
            .unwrap();

        assert!(saved.created_at.is_some());
        assert_eq!(saved.created_at, saved.updated_at);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_keeps_created_at() {
        let store = MemoryTransactionStore::new();
        let id = Uuid::new_v4();

        let first = store.upsert(transaction(id, "123", date(2024, 1, 5), 10)).await.unwrap();
        let second = store.upsert(transaction(id, "123", date(2024, 1, 6), 20)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.amount, BigDecimal::from(20));
        assert_eq!(stored.value_date, date(2024, 1, 6));
    }

    #[tokio::test]
    async fn test_find_page_filters_orders_and_paginates() {
        let store = MemoryTransactionStore::new();
        for day in 1..=5 {
            store
                .upsert(transaction(Uuid::new_v4(), "123", date(2024, 1, day), i64::from(day)))
                .await
                .unwrap();
        }
        store.upsert(transaction(Uuid::new_v4(), "123", date(2024, 2, 1), 99)).await.unwrap();
        store.upsert(transaction(Uuid::new_v4(), "456", date(2024, 1, 1), 99)).await.unwrap();

        let page = store.find_page("123", date(2024, 1, 1), PageRequest::new(1, 2)).await.unwrap();

        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.size, 2);
        let days: Vec<NaiveDate> = page.items.iter().map(|t| t.value_date).collect();
        assert_eq!(days, vec![date(2024, 1, 3), date(2024, 1, 4)]);
    }

    #[tokio::test]
    async fn test_find_page_for_unknown_customer_is_empty() {
        let store = MemoryTransactionStore::new();
        let page = store.find_page("nobody", date(2024, 1, 1), PageRequest::new(0, 10)).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_elements, 0);
        assert_eq!(page.total_pages, 0);
    }
}
