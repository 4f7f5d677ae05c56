use crate::error::StoreError;
use crate::models::{PageRequest, StoredTransaction, TransactionRow};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// 建表 `transactions` 及查询索引 (不存在时)
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id               UUID PRIMARY KEY,
            customer_id      VARCHAR(64)  NOT NULL,
            account_iban     VARCHAR(64)  NOT NULL,
            currency         VARCHAR(16)  NOT NULL,
            amount           NUMERIC      NOT NULL,
            transaction_type VARCHAR(8)   NOT NULL,
            value_date       DATE         NOT NULL,
            month_key        DATE         NOT NULL,
            description      TEXT         NOT NULL DEFAULT '',
            created_at       TIMESTAMPTZ  NOT NULL,
            updated_at       TIMESTAMPTZ  NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_customer_month
            ON transactions (customer_id, month_key)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// 按 id 插入或覆盖, 已有记录的 `created_at` 不变
pub async fn upsert_transaction(
    pool: &PgPool,
    tx: &StoredTransaction,
) -> Result<TransactionRow, StoreError> {
    let query = sqlx::query_as::<_, TransactionRow>(
        r#"
        INSERT INTO transactions (
            id, customer_id, account_iban, currency, amount,
            transaction_type, value_date, month_key, description,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            customer_id      = EXCLUDED.customer_id,
            account_iban     = EXCLUDED.account_iban,
            currency         = EXCLUDED.currency,
            amount           = EXCLUDED.amount,
            transaction_type = EXCLUDED.transaction_type,
            value_date       = EXCLUDED.value_date,
            month_key        = EXCLUDED.month_key,
            description      = EXCLUDED.description,
            updated_at       = EXCLUDED.updated_at
        RETURNING id, customer_id, account_iban, currency, amount,
                  transaction_type, value_date, month_key, description,
                  created_at, updated_at
        "#,
    )
    .bind(tx.id)
    .bind(&tx.customer_id)
    .bind(&tx.account_iban)
    .bind(&tx.currency)
    .bind(&tx.amount)
    .bind(tx.transaction_type.as_str())
    .bind(tx.value_date)
    .bind(tx.month_key)
    .bind(&tx.description)
    .bind(tx.created_at)
    .bind(tx.updated_at);

    let start_time = std::time::Instant::now();
    match tokio::time::timeout(WRITE_TIMEOUT, query.fetch_one(pool)).await {
        Ok(Ok(row)) => {
            tracing::debug!("UPSERT transaction {} took {:?}", tx.id, start_time.elapsed());
            Ok(row)
        }
        Ok(Err(e)) => {
            tracing::error!("UPSERT transaction {} failed after {:?}: {:?}", tx.id, start_time.elapsed(), e);
            Err(StoreError::Database(e))
        }
        Err(_) => {
            tracing::error!("UPSERT transaction {} timed out (>30s)", tx.id);
            Err(StoreError::Timeout)
        }
    }
}

/// 查询单笔交易
pub async fn get_transaction(pool: &PgPool, id: Uuid) -> Result<Option<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(
        r#"
        SELECT id, customer_id, account_iban, currency, amount,
               transaction_type, value_date, month_key, description,
               created_at, updated_at
        FROM transactions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// 客户某月的一页交易, 按起息日, id 排序
pub async fn list_by_customer_and_month(
    pool: &PgPool,
    customer_id: &str,
    month_key: NaiveDate,
    request: PageRequest,
) -> Result<Vec<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(
        r#"
        SELECT id, customer_id, account_iban, currency, amount,
               transaction_type, value_date, month_key, description,
               created_at, updated_at
        FROM transactions
        WHERE customer_id = $1
          AND month_key = $2
        ORDER BY value_date, id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(customer_id)
    .bind(month_key)
    .bind(i64::from(request.size))
    .bind(request.offset() as i64)
    .fetch_all(pool)
    .await
}

/// 客户某月的交易总数
pub async fn count_by_customer_and_month(
    pool: &PgPool,
    customer_id: &str,
    month_key: NaiveDate,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT count(*)
        FROM transactions
        WHERE customer_id = $1
          AND month_key = $2
        "#,
    )
    .bind(customer_id)
    .bind(month_key)
    .fetch_one(pool)
    .await
}
