use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use txn_statement_rust::config::FxConfig;
use txn_statement_rust::{ExchangeRateHostLookup, RateLookup};

type Calls = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// 临时汇率服务: `/live` 固定返回给定状态码和原始 JSON 文本
async fn spawn_provider(status: StatusCode, body: String) -> anyhow::Result<(String, Calls)> {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();

    let app = Router::new().route(
        "/live",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let body = body.clone();
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(params);
                (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((format!("http://{}", addr), calls))
}

fn lookup(base_url: &str) -> anyhow::Result<ExchangeRateHostLookup> {
    Ok(ExchangeRateHostLookup::new(&FxConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
    })?)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 10, 5).unwrap()
}

fn one() -> BigDecimal {
    BigDecimal::from(1)
}

#[tokio::test]
async fn test_live_quote_is_returned_exactly() -> anyhow::Result<()> {
    let body = json!({
        "success": true,
        "terms": "https://exchangerate.host/terms",
        "privacy": "https://exchangerate.host/privacy",
        "timestamp": 1432400348,
        "source": "CHF",
        "quotes": { "CHFIDR": 17000.12 }
    });
    let (url, calls) = spawn_provider(StatusCode::OK, body.to_string()).await?;

    let rate = lookup(&url)?.rate(date(), "CHF", "IDR").await;
    assert_eq!(rate, BigDecimal::from_str("17000.12")?);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].get("source").map(String::as_str), Some("CHF"));
    assert_eq!(calls[0].get("currencies").map(String::as_str), Some("IDR"));
    assert_eq!(calls[0].get("access_key").map(String::as_str), Some("test-key"));
    Ok(())
}

#[tokio::test]
async fn test_quote_beyond_f64_precision_is_kept() -> anyhow::Result<()> {
    // 24 位有效数字, f64 只能保留约 17 位
    let body = r#"{"success":true,"source":"USD","quotes":{"USDIDR":15500.123456789012345678}}"#;
    let (url, _) = spawn_provider(StatusCode::OK, body.to_string()).await?;

    let rate = lookup(&url)?.rate(date(), "USD", "IDR").await;
    assert_eq!(rate, BigDecimal::from_str("15500.123456789012345678")?);
    Ok(())
}

#[tokio::test]
async fn test_same_currency_never_calls_provider() -> anyhow::Result<()> {
    let body = json!({ "success": true, "quotes": {} });
    let (url, calls) = spawn_provider(StatusCode::OK, body.to_string()).await?;

    assert_eq!(lookup(&url)?.rate(date(), "IDR", "IDR").await, one());
    assert!(calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_pair_falls_back_to_identity() -> anyhow::Result<()> {
    let body = json!({ "success": true, "source": "USD", "quotes": { "USDEUR": 0.92 } });
    let (url, _) = spawn_provider(StatusCode::OK, body.to_string()).await?;

    assert_eq!(lookup(&url)?.rate(date(), "USD", "IDR").await, one());
    Ok(())
}

#[tokio::test]
async fn test_non_numeric_quote_falls_back_to_identity() -> anyhow::Result<()> {
    let body = json!({ "success": true, "source": "USD", "quotes": { "USDIDR": "n/a" } });
    let (url, _) = spawn_provider(StatusCode::OK, body.to_string()).await?;

    assert_eq!(lookup(&url)?.rate(date(), "USD", "IDR").await, one());
    Ok(())
}

#[tokio::test]
async fn test_unsuccessful_response_falls_back_to_identity() -> anyhow::Result<()> {
    let body = json!({ "success": false, "error": { "code": 101, "info": "invalid access key" } });
    let (url, _) = spawn_provider(StatusCode::OK, body.to_string()).await?;

    assert_eq!(lookup(&url)?.rate(date(), "USD", "IDR").await, one());
    Ok(())
}

#[tokio::test]
async fn test_server_error_falls_back_to_identity() -> anyhow::Result<()> {
    let body = json!({ "message": "boom" });
    let (url, _) = spawn_provider(StatusCode::INTERNAL_SERVER_ERROR, body.to_string()).await?;

    assert_eq!(lookup(&url)?.rate(date(), "USD", "IDR").await, one());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_provider_falls_back_to_identity() -> anyhow::Result<()> {
    assert_eq!(lookup("http://127.0.0.1:1")?.rate(date(), "CHF", "IDR").await, one());
    Ok(())
}
