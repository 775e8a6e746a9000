pub mod time_parser;
pub mod url_validator;

pub use time_parser::TimeParser;
pub use url_validator::{UrlValidationError, validate_url};

/// 自定义短码最大长度
pub const MAX_CODE_LENGTH: usize = 64;

/// 短码字符集：字母、数字、`-`、`_`
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// 规范化请求路径中的短码：去掉首尾 `/`，按需转小写
pub fn normalize_code(raw: &str, ignore_case: bool) -> String {
    let trimmed = raw.trim_matches('/');
    if ignore_case {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}
