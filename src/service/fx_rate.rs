use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reqwest::Client;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::FxConfig;
use crate::error::RateProviderError;
use crate::models::RateResponse;

/// 汇率查询 (永不失败: 无法获得汇率时返回 1)
#[async_trait]
pub trait RateLookup: Send + Sync {
    async fn rate(&self, date: NaiveDate, from: &str, to: &str) -> BigDecimal;
}

fn identity() -> BigDecimal {
    BigDecimal::from(1)
}

/// 实时汇率 (兼容 exchangerate.host 的 `/live` 接口)
pub struct ExchangeRateHostLookup {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateHostLookup {
    /// HTTP 客户端构建失败 (TLS 后端不可用等) 时返回错误
    pub fn new(config: &FxConfig) -> Result<Self, RateProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// 单次请求, 不重试
    async fn fetch_live_rate(&self, from: &str, to: &str) -> Result<BigDecimal, RateProviderError> {
        let url = format!("{}/live", self.base_url);
        let response: RateResponse = self
            .client
            .get(&url)
            .query(&[
                ("source", from),
                ("currencies", to),
                ("access_key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success {
            return Err(RateProviderError::Rejected);
        }

        let pair = format!("{}{}", from, to);
        let text = response
            .quote_text(&pair)
            .ok_or_else(|| RateProviderError::MissingQuote(pair.clone()))?;

        BigDecimal::from_str(text).map_err(|_| RateProviderError::InvalidQuote {
            pair,
            value: text.to_string(),
        })
    }
}

#[async_trait]
impl RateLookup for ExchangeRateHostLookup {
    async fn rate(&self, date: NaiveDate, from: &str, to: &str) -> BigDecimal {
        if from == to {
            debug!("Same currency conversion: {} -> {}, returning 1", from, to);
            return identity();
        }

        // 实时接口不支持按日期查询
        debug!("Fetching FX rate: {} -> {} for date {}", from, to, date);

        match self.fetch_live_rate(from, to).await {
            Ok(rate) => {
                info!("FX rate retrieved: {} -> {} = {}", from, to, rate);
                rate
            }
            Err(e) => {
                warn!("Failed to fetch FX rate {} -> {}, falling back to 1: {}", from, to, e);
                identity()
            }
        }
    }
}

/// 固定汇率表 (键为 `FROMTO`), 未命中返回 1
#[derive(Debug, Default, Clone)]
pub struct FixedRateLookup {
    rates: HashMap<String, BigDecimal>,
}

impl FixedRateLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: BigDecimal) -> Self {
        self.rates.insert(format!("{}{}", from, to), rate);
        self
    }
}

#[async_trait]
impl RateLookup for FixedRateLookup {
    async fn rate(&self, _date: NaiveDate, from: &str, to: &str) -> BigDecimal {
        if from == to {
            return identity();
        }
        self.rates
            .get(&format!("{}{}", from, to))
            .cloned()
            .unwrap_or_else(identity)
    }
}
