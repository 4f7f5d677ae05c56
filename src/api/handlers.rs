use crate::error::ApiError;
use crate::models::{PageRequest, StatementPage};
use crate::service::{month_key, StatementAssembler};
use axum::{
    extract::{Json, Query, State},
    http::HeaderMap,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

/// 认证网关转发的客户 id 请求头
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

/// 对账单路由共享状态
#[derive(Clone)]
pub struct StatementState {
    pub assembler: Arc<StatementAssembler>,
    pub max_page_size: u32,
}

/// `GET /api/v1/transactions` 查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementQuery {
    pub month_key: NaiveDate,
    #[serde(default)]
    pub page: u32,
    pub size: u32,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 按本位币折算的月度对账单分页
pub async fn list_transactions(
    State(state): State<StatementState>,
    headers: HeaderMap,
    Query(query): Query<StatementQuery>,
) -> Result<Json<StatementPage>, ApiError> {
    let customer_id = headers
        .get(CUSTOMER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    if query.size == 0 || query.size > state.max_page_size {
        return Err(ApiError::BadRequest(format!(
            "size must be between 1 and {}",
            state.max_page_size
        )));
    }

    let month = month_key(query.month_key);
    tracing::info!(
        "API request: GET /api/v1/transactions customer={} month={} page={} size={}",
        customer_id, month, query.page, query.size
    );

    match state
        .assembler
        .assemble(customer_id, month, PageRequest::new(query.page, query.size))
        .await
    {
        Ok(page) => {
            tracing::info!("API response: {} transactions returned", page.transactions.len());
            Ok(Json(page))
        }
        Err(e) => {
            tracing::error!("API error: customer={} month={}: {}", customer_id, month, e);
            Err(e.into())
        }
    }
}
