use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Direction;

/// 对账单中折算后的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    pub id: Uuid,
    pub account_iban: String,
    /// 恒为本位币
    pub currency: String,
    pub amount: BigDecimal,
    pub value_date: NaiveDate,
    pub description: String,
    pub transaction_type: Direction,
}

/// 对账单响应, 合计只统计本页
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPage {
    pub transactions: Vec<StatementLine>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub currency: String,
    pub total_credit: BigDecimal,
    pub total_debit: BigDecimal,
}
