use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

use super::fx_rate::RateLookup;
use crate::db::TransactionStore;
use crate::error::StatementError;
use crate::models::{Direction, PageRequest, StatementLine, StatementPage};

/// 生成按本位币折算的对账单
pub struct StatementAssembler {
    store: Arc<dyn TransactionStore>,
    rates: Arc<dyn RateLookup>,
    base_currency: String,
}

impl StatementAssembler {
    pub fn new(store: Arc<dyn TransactionStore>, rates: Arc<dyn RateLookup>, base_currency: String) -> Self {
        Self {
            store,
            rates,
            base_currency,
        }
    }

    /// 客户某月的一页对账单. `total_credit`/`total_debit` 只统计本页,
    /// 分页信息覆盖整月
    pub async fn assemble(
        &self,
        customer_id: &str,
        month_key: NaiveDate,
        request: PageRequest,
    ) -> Result<StatementPage, StatementError> {
        if request.size == 0 {
            return Err(StatementError::InvalidPage("page size must be positive".to_string()));
        }

        info!(
            "Fetching transactions: customer={}, month={}, page={}, size={}",
            customer_id, month_key, request.page, request.size
        );

        // 1. 从存储取一页
        let page = self.store.find_page(customer_id, month_key, request).await?;
        debug!(
            "Found {} transactions for customer {} in month {}",
            page.total_elements, customer_id, month_key
        );

        // 2. 汇率查询互不依赖, 并发执行
        let rates = join_all(
            page.items
                .iter()
                .map(|tx| self.rates.rate(tx.value_date, &tx.currency, &self.base_currency)),
        )
        .await;

        // 3. 按存储顺序折算并累加
        let mut total_credit = BigDecimal::zero();
        let mut total_debit = BigDecimal::zero();
        let mut lines = Vec::with_capacity(page.items.len());

        for (tx, rate) in page.items.into_iter().zip(rates) {
            let converted = &tx.amount * &rate;

            match tx.transaction_type {
                Direction::Credit => total_credit = &total_credit + &converted,
                Direction::Debit => total_debit = &total_debit + &converted,
            }

            lines.push(StatementLine {
                id: tx.id,
                account_iban: tx.account_iban,
                currency: self.base_currency.clone(),
                amount: converted,
                value_date: tx.value_date,
                description: tx.description,
                transaction_type: tx.transaction_type,
            });
        }

        info!(
            "Returning transaction page: items={}, totalCredit={}, totalDebit={}",
            lines.len(),
            total_credit,
            total_debit
        );

        Ok(StatementPage {
            transactions: lines,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            currency: self.base_currency.clone(),
            total_credit,
            total_debit,
        })
    }
}
