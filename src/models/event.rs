use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 交易入账通知, 每条消息一个 JSON 对象
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub id: Uuid,
    pub customer_id: String,
    pub account_iban: String,
    /// `"<币种> <金额>[-]"`
    pub currency_amount: String,
    pub value_date: NaiveDate,
    #[serde(default)]
    pub description: String,
}
