use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;
use txn_statement_rust::api::{self, StatementState};
use txn_statement_rust::db::ensure_schema;
use txn_statement_rust::{
    create_pool, AppConfig, EventConsumer, ExchangeRateHostLookup, IngestionProcessor,
    MemoryTransactionStore, PgTransactionStore, RateLookup, StatementAssembler, TransactionStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 (本地时间, 级别取自 RUST_LOG)
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 存储
    let store: Arc<dyn TransactionStore> = if config.database.url == "memory" {
        warn!("Using in-memory transaction store, data is lost on exit");
        Arc::new(MemoryTransactionStore::new())
    } else {
        let pool = create_pool(&config.database).await?;
        ensure_schema(&pool).await?;
        info!("Database pool created");
        Arc::new(PgTransactionStore::new(pool))
    };

    // 服务
    let rates: Arc<dyn RateLookup> = Arc::new(ExchangeRateHostLookup::new(&config.fx)?);
    let processor = Arc::new(IngestionProcessor::new(store.clone()));
    let assembler = Arc::new(StatementAssembler::new(
        store,
        rates,
        config.statement.base_currency.clone(),
    ));

    // 事件消费与 HTTP 服务并行运行
    spawn_consumer(processor, &config);

    let app = api::router(StatementState {
        assembler,
        max_page_size: config.statement.max_page_size,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET /api/v1/transactions?monthKey=&page=&size=  - monthly statement page");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_consumer(processor: Arc<IngestionProcessor>, config: &AppConfig) {
    let consumer_config = config.consumer.clone();
    let source = consumer_config.source.clone();
    let consumer = EventConsumer::new(processor, consumer_config);

    match source.as_str() {
        "none" => info!("Event consumer disabled"),
        "stdin" => {
            info!("Consuming transaction events from stdin");
            tokio::spawn(async move {
                consumer.run(BufReader::new(tokio::io::stdin())).await;
            });
        }
        path => {
            let path = path.to_string();
            info!("Consuming transaction events from {}", path);
            tokio::spawn(async move {
                match tokio::fs::File::open(&path).await {
                    Ok(file) => {
                        consumer.run(BufReader::new(file)).await;
                    }
                    Err(e) => error!("Cannot open event source {}: {}", path, e),
                }
            });
        }
    }
}
