pub mod handlers;

pub use handlers::*;

use axum::{routing::get, Router};
use tower::ServiceBuilder;

/// 构建 HTTP 路由
pub fn router(state: StatementState) -> Router {
    let statement_routes = Router::new()
        .route("/api/v1/transactions", get(list_transactions))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(statement_routes)
        .layer(ServiceBuilder::new())
}
