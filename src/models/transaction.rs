use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StoreError;

/// 贷记 CREDIT (入账) 或借记 DEBIT (出账)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "CREDIT",
            Direction::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(Direction::Credit),
            "DEBIT" => Ok(Direction::Debit),
            other => Err(format!("unknown transaction type [{}]", other)),
        }
    }
}

/// `"<币种> <金额>[-]"` 的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAmount {
    pub currency: String,
    /// 恒为非负, 正负由 `direction` 表示
    pub magnitude: BigDecimal,
    pub direction: Direction,
}

/// 已入库交易, 以事件 id 为主键
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTransaction {
    pub id: Uuid,
    pub customer_id: String,
    pub account_iban: String,
    pub currency: String,
    pub amount: BigDecimal,
    pub transaction_type: Direction,
    pub value_date: NaiveDate,
    pub month_key: NaiveDate,
    pub description: String,
    /// 首次写入前为空
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredTransaction {
    /// 写前钩子, 每个存储实现在写入前调用
    pub fn stamp_for_write(&mut self, now: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }
}

/// `transactions` 表行结构
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub customer_id: String,
    pub account_iban: String,
    pub currency: String,
    pub amount: BigDecimal,
    pub transaction_type: String,
    pub value_date: NaiveDate,
    pub month_key: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for StoredTransaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let transaction_type = row
            .transaction_type
            .parse::<Direction>()
            .map_err(|reason| StoreError::CorruptRow { id: row.id, reason })?;

        Ok(StoredTransaction {
            id: row.id,
            customer_id: row.customer_id,
            account_iban: row.account_iban,
            currency: row.currency,
            amount: row.amount,
            transaction_type,
            value_date: row.value_date,
            month_key: row.month_key,
            description: row.description,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}
