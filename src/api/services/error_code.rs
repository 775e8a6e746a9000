//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::ShortlinkError;

/// API 错误码
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 链接错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 链接错误 3000-3099
    LinkNotFound = 3000,
    LinkAlreadyExists = 3001,
    LinkValidationFailed = 3002,
    LinkDatabaseError = 3005,
    LinkCodeSpaceExhausted = 3007,
}

impl From<&ShortlinkError> for ErrorCode {
    fn from(err: &ShortlinkError) -> Self {
        match err {
            ShortlinkError::NotFound(_) => ErrorCode::LinkNotFound,
            ShortlinkError::Conflict(_) => ErrorCode::LinkAlreadyExists,
            ShortlinkError::Validation(_) => ErrorCode::LinkValidationFailed,
            ShortlinkError::Exhausted(_) => ErrorCode::LinkCodeSpaceExhausted,
            ShortlinkError::Unauthorized(_) => ErrorCode::Unauthorized,
            ShortlinkError::Forbidden(_) => ErrorCode::Forbidden,
            ShortlinkError::StoreUnavailable(_) => ErrorCode::LinkDatabaseError,
            ShortlinkError::DatabaseConfig(_) => ErrorCode::InternalServerError,
        }
    }
}
