use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 监听地址、端口、worker 数量
/// - database: 数据库连接与重试配置
/// - cache: 读穿透缓存配置
/// - generator: 短码生成配置
/// - routing: 路由前缀与重定向行为
/// - auth: API Key 与所有者映射
/// - hits: 点击计数刷盘配置
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub hits: HitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：SL，分隔符：__
    /// 示例：SL__SERVER__PORT=9999
    pub fn load(path: &str) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                if std::path::Path::new(path).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path);
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    /// 加载配置，出错时返回错误而不是回退到默认值
    pub fn try_load(path: &str) -> Result<Self, config::ConfigError> {
        use config::{Config, Environment, File};

        Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 SL，分隔符 __
            .add_source(
                Environment::with_prefix("SL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<StaticConfig>()
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 单个请求的处理上限（毫秒）
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 建立连接的超时时间（秒）
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    /// 单次数据库操作的超时时间（毫秒）
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// 缓存条目最长存活时间（秒），与链接自身的 expires_at 无关
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
    /// 负缓存（不存在/不可用短码）的存活时间（秒）
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl: u64,
    #[serde(default = "default_negative_capacity")]
    pub negative_capacity: u64,
    /// 启动时预热的链接数量，0 表示不预热
    #[serde(default = "default_warmup_limit")]
    pub warmup_limit: u64,
}

/// 短码生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_code_length")]
    pub length: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

/// 路由与重定向行为配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
    /// 短码大小写不敏感（统一转为小写）
    #[serde(default)]
    pub ignore_case: bool,
    /// 访问根路径时的跳转目标
    #[serde(default)]
    pub root_redirect: Option<String>,
    /// 重定向响应的 Cache-Control max-age（秒）
    #[serde(default = "default_http_cache_max_age")]
    pub http_cache_max_age: u32,
    #[serde(default = "default_use_etag")]
    pub use_etag: bool,
    /// 允许通过 `/{code}+` 查看链接信息
    #[serde(default = "default_enable_info_request")]
    pub enable_info_request: bool,
    #[serde(default)]
    pub show_server_header: bool,
    /// 重定向路径上单次存储查询的超时时间（毫秒）
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,
}

/// API Key 认证配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// 管理员 Key，可操作任意链接
    #[serde(default)]
    pub admin_key: Option<String>,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
}

/// 单个 API Key 与其所有者
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    pub owner: String,
    pub key: String,
}

/// 点击计数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitsConfig {
    #[serde(default = "default_hits_enabled")]
    pub enabled: bool,
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_max_buffered")]
    pub max_buffered: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_database_url() -> String {
    "sqlite://links.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    8
}

fn default_operation_timeout_ms() -> u64 {
    2000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_negative_ttl() -> u64 {
    60
}

fn default_negative_capacity() -> u64 {
    10000
}

fn default_warmup_limit() -> u64 {
    1000
}

fn default_code_length() -> usize {
    6
}

fn default_max_attempts() -> u32 {
    8
}

fn default_backoff_base_ms() -> u64 {
    2
}

fn default_backoff_max_ms() -> u64 {
    50
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_http_cache_max_age() -> u32 {
    60
}

fn default_use_etag() -> bool {
    true
}

fn default_enable_info_request() -> bool {
    true
}

fn default_resolve_timeout_ms() -> u64 {
    1000
}

fn default_hits_enabled() -> bool {
    true
}

fn default_flush_interval() -> u64 {
    30
}

fn default_max_buffered() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            operation_timeout_ms: default_operation_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            default_ttl: default_cache_ttl(),
            max_capacity: default_memory_capacity(),
            negative_ttl: default_negative_ttl(),
            negative_capacity: default_negative_capacity(),
            warmup_limit: default_warmup_limit(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: default_code_length(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            health_prefix: default_health_prefix(),
            ignore_case: false,
            root_redirect: None,
            http_cache_max_age: default_http_cache_max_age(),
            use_etag: default_use_etag(),
            enable_info_request: default_enable_info_request(),
            show_server_header: false,
            resolve_timeout_ms: default_resolve_timeout_ms(),
        }
    }
}

impl Default for HitsConfig {
    fn default() -> Self {
        Self {
            enabled: default_hits_enabled(),
            flush_interval_secs: default_flush_interval(),
            max_buffered: default_max_buffered(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl RoutingConfig {
    /// 与短码命名空间冲突的保留路径段（如 "api"、"health"）
    pub fn reserved_segments(&self) -> Vec<String> {
        [&self.api_prefix, &self.health_prefix]
            .iter()
            .filter_map(|prefix| {
                prefix
                    .trim_matches('/')
                    .split('/')
                    .next()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_lowercase())
            })
            .collect()
    }
}
