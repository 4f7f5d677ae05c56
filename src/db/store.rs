use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::queries;
use crate::error::StoreError;
use crate::models::{Page, PageRequest, StoredTransaction};

/// 交易持久化存储
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// 按 `id` 插入或覆盖 (后写为准), 实现方在写入前调用
    /// [`StoredTransaction::stamp_for_write`]
    async fn upsert(&self, tx: StoredTransaction) -> Result<StoredTransaction, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredTransaction>, StoreError>;

    /// 客户某月的一页交易, 附带当月总数
    async fn find_page(
        &self,
        customer_id: &str,
        month_key: NaiveDate,
        request: PageRequest,
    ) -> Result<Page<StoredTransaction>, StoreError>;
}

/// 基于 Postgres 的存储
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn upsert(&self, mut tx: StoredTransaction) -> Result<StoredTransaction, StoreError> {
        tx.stamp_for_write(Utc::now());
        let row = queries::upsert_transaction(&self.pool, &tx).await?;
        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredTransaction>, StoreError> {
        queries::get_transaction(&self.pool, id)
            .await?
            .map(StoredTransaction::try_from)
            .transpose()
    }

    async fn find_page(
        &self,
        customer_id: &str,
        month_key: NaiveDate,
        request: PageRequest,
    ) -> Result<Page<StoredTransaction>, StoreError> {
        let total = queries::count_by_customer_and_month(&self.pool, customer_id, month_key).await?;
        if total == 0 {
            return Ok(Page::empty(request));
        }

        let rows = queries::list_by_customer_and_month(&self.pool, customer_id, month_key, request).await?;
        let items = rows
            .into_iter()
            .map(StoredTransaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, request, total as u64))
    }
}
