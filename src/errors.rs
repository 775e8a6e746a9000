use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortlinkError {
    /// 短码不存在、已过期或已禁用
    NotFound(String),
    /// 自定义短码已被占用，或并发创建中落败
    Conflict(String),
    Validation(String),
    /// 生成器在有限次数内找不到空闲短码
    Exhausted(String),
    /// 缺少凭证
    Unauthorized(String),
    /// 凭证有效但不是链接所有者
    Forbidden(String),
    /// 存储后端故障或超时
    StoreUnavailable(String),
    DatabaseConfig(String),
}

impl ShortlinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortlinkError::NotFound(_) => "E001",
            ShortlinkError::Conflict(_) => "E002",
            ShortlinkError::Validation(_) => "E003",
            ShortlinkError::Exhausted(_) => "E004",
            ShortlinkError::Unauthorized(_) => "E005",
            ShortlinkError::Forbidden(_) => "E006",
            ShortlinkError::StoreUnavailable(_) => "E007",
            ShortlinkError::DatabaseConfig(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortlinkError::NotFound(_) => "Link Not Found",
            ShortlinkError::Conflict(_) => "Short Code Conflict",
            ShortlinkError::Validation(_) => "Validation Error",
            ShortlinkError::Exhausted(_) => "Code Space Exhausted",
            ShortlinkError::Unauthorized(_) => "Unauthorized",
            ShortlinkError::Forbidden(_) => "Forbidden",
            ShortlinkError::StoreUnavailable(_) => "Store Unavailable",
            ShortlinkError::DatabaseConfig(_) => "Database Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortlinkError::NotFound(msg)
            | ShortlinkError::Conflict(msg)
            | ShortlinkError::Validation(msg)
            | ShortlinkError::Exhausted(msg)
            | ShortlinkError::Unauthorized(msg)
            | ShortlinkError::Forbidden(msg)
            | ShortlinkError::StoreUnavailable(msg)
            | ShortlinkError::DatabaseConfig(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            ShortlinkError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortlinkError::Conflict(_) => StatusCode::CONFLICT,
            ShortlinkError::Validation(_) => StatusCode::BAD_REQUEST,
            ShortlinkError::Exhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            ShortlinkError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ShortlinkError::Forbidden(_) => StatusCode::FORBIDDEN,
            ShortlinkError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ShortlinkError::DatabaseConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortlinkError {}

// 便捷的构造函数
impl ShortlinkError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::Conflict(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::Validation(msg.into())
    }

    pub fn exhausted<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::Exhausted(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::Forbidden(msg.into())
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::StoreUnavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortlinkError::DatabaseConfig(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortlinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                ShortlinkError::Conflict(msg)
            }
            _ => ShortlinkError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<chrono::ParseError> for ShortlinkError {
    fn from(err: chrono::ParseError) -> Self {
        ShortlinkError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortlinkError>;
