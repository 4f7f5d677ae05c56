use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// `currencyAmount` 原始字符串无法解析的原因
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("no space separates currency and amount in [{0}]")]
    MissingSeparator(String),
    #[error("amount is empty in [{0}]")]
    EmptyMagnitude(String),
    #[error("amount [{magnitude}] is not a valid decimal in [{raw}]")]
    InvalidMagnitude { raw: String, magnitude: String },
}

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored row [{id}] is corrupt: {reason}")]
    CorruptRow { id: Uuid, reason: String },
    #[error("storage operation timed out")]
    Timeout,
}

/// 入账链路错误, 全部交给传输层处理
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed amount for transaction [{id}]: {source}")]
    MalformedAmount {
        id: Uuid,
        #[source]
        source: AmountError,
    },
    #[error("failed to persist transaction [{id}]: {source}")]
    Persistence {
        id: Uuid,
        #[source]
        source: StoreError,
    },
    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl IngestError {
    /// 只有存储错误重投后可能成功
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::Persistence { .. })
    }
}

/// 汇率服务错误, 在汇率查询内部降级处理, 不向外抛出
#[derive(Debug, Error)]
pub enum RateProviderError {
    #[error("rate provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate provider rejected the request")]
    Rejected,
    #[error("rate provider returned no quote for [{0}]")]
    MissingQuote(String),
    #[error("rate provider returned an invalid quote for [{pair}]: {value}")]
    InvalidQuote { pair: String, value: String },
}

/// 对账单查询错误
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("invalid page request: {0}")]
    InvalidPage(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// HTTP 处理器返回的错误
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing customer identity")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<StatementError> for ApiError {
    fn from(e: StatementError) -> Self {
        match e {
            StatementError::InvalidPage(msg) => ApiError::BadRequest(msg),
            StatementError::Persistence(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            success: false,
            message: format!("Error: {}", self),
        };
        (status, Json(body)).into_response()
    }
}
