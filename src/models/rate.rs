use serde::Deserialize;
use serde_json::value::RawValue;
use std::collections::HashMap;

/// 汇率服务 `/live` 接口响应
#[derive(Debug, Deserialize)]
pub struct RateResponse {
    pub success: bool,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    /// 键为币种对 (如 `USDIDR`), 保留原始 JSON 文本, 不经过 f64
    #[serde(default)]
    pub quotes: HashMap<String, Box<RawValue>>,
}

impl RateResponse {
    /// 取出某币种对的原始数值文本 (兼容字符串形式的报价)
    pub fn quote_text(&self, pair: &str) -> Option<&str> {
        self.quotes
            .get(pair)
            .map(|raw| raw.get().trim().trim_matches('"'))
    }
}
