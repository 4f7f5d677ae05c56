use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub fx: FxConfig,
    pub statement: StatementConfig,
    pub consumer: ConsumerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres 连接串, `memory` 表示使用进程内存储
    pub url: String,
    pub max_connections: u32,
    /// 慢 SQL 阈值 (秒)
    pub slow_statement_secs: u64,
    /// 获取连接超时 (秒)
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct FxConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for FxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FxConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementConfig {
    /// 对账单统一折算的本位币
    pub base_currency: String,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// `stdin`, 文件路径, 或 `none` (不启动消费)
    pub source: String,
    pub partitions: usize,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/transactions".to_string(),
                max_connections: 20,
                slow_statement_secs: 5,
                acquire_timeout_secs: 10,
            },
            fx: FxConfig {
                base_url: "https://api.exchangerate.host".to_string(),
                api_key: String::new(),
                timeout_secs: 10,
            },
            statement: StatementConfig {
                base_currency: "IDR".to_string(),
                max_page_size: 100,
            },
            consumer: ConsumerConfig::default(),
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            source: "stdin".to_string(),
            partitions: 4,
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl AppConfig {
    /// 加载顺序: 默认值 -> `config/default.toml` (可选) -> `APP_*` 环境变量
    /// (如 `APP_FX__API_KEY`) -> `DATABASE_URL`/`SERVER_*` 覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let settings = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("database.slow_statement_secs", defaults.database.slow_statement_secs as i64)?
            .set_default("database.acquire_timeout_secs", defaults.database.acquire_timeout_secs as i64)?
            .set_default("fx.base_url", defaults.fx.base_url)?
            .set_default("fx.api_key", defaults.fx.api_key)?
            .set_default("fx.timeout_secs", defaults.fx.timeout_secs as i64)?
            .set_default("statement.base_currency", defaults.statement.base_currency)?
            .set_default("statement.max_page_size", i64::from(defaults.statement.max_page_size))?
            .set_default("consumer.source", defaults.consumer.source)?
            .set_default("consumer.partitions", defaults.consumer.partitions as i64)?
            .set_default("consumer.max_attempts", i64::from(defaults.consumer.max_attempts))?
            .set_default("consumer.retry_backoff_ms", defaults.consumer.retry_backoff_ms as i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option(
                "server.port",
                std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse::<u16>().ok())
                    .map(i64::from),
            )?
            .build()?;

        settings.try_deserialize()
    }
}
