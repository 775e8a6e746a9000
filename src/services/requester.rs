//! 调用方身份

use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::errors::{Result, ShortlinkError};
use crate::storage::LinkMapping;

/// 通过 API Key 解析出的调用方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Owner(String),
    /// 管理员可操作任意链接，包括无所有者的链接
    Admin,
}

impl Requester {
    /// 在配置的 Key 中查找 token；每个 Key 都参与比较
    pub fn from_token(token: &str, auth: &AuthConfig) -> Option<Self> {
        let token = token.as_bytes();
        let mut found = None;

        if let Some(admin_key) = auth.admin_key.as_deref().filter(|k| !k.is_empty())
            && bool::from(admin_key.as_bytes().ct_eq(token))
        {
            found = Some(Requester::Admin);
        }

        for entry in &auth.api_keys {
            if entry.key.is_empty() {
                continue;
            }
            if bool::from(entry.key.as_bytes().ct_eq(token)) && found.is_none() {
                found = Some(Requester::Owner(entry.owner.clone()));
            }
        }

        found
    }

    /// 列表查询时的所有者过滤条件，管理员不过滤
    pub fn owner_filter(&self) -> Option<&str> {
        match self {
            Requester::Owner(owner) => Some(owner),
            Requester::Admin => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Requester::Owner(owner) => owner,
            Requester::Admin => "admin",
        }
    }

    /// 检查是否可以操作该链接：管理员或所有者本人
    pub fn authorize(&self, link: &LinkMapping) -> Result<()> {
        match (self, link.owner.as_deref()) {
            (Requester::Admin, _) => Ok(()),
            (Requester::Owner(me), Some(owner)) if me == owner => Ok(()),
            _ => Err(ShortlinkError::forbidden(format!(
                "'{}' is not allowed to modify link '{}'",
                self.display_name(),
                link.code
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeyConfig;

    fn auth() -> AuthConfig {
        AuthConfig {
            admin_key: Some("root-secret".to_string()),
            api_keys: vec![
                ApiKeyConfig {
                    owner: "alice".to_string(),
                    key: "alice-key".to_string(),
                },
                ApiKeyConfig {
                    owner: "bob".to_string(),
                    key: "bob-key".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_from_token() {
        let auth = auth();
        assert_eq!(Requester::from_token("root-secret", &auth), Some(Requester::Admin));
        assert_eq!(
            Requester::from_token("bob-key", &auth),
            Some(Requester::Owner("bob".to_string()))
        );
        assert_eq!(Requester::from_token("bob-key ", &auth), None);
        assert_eq!(Requester::from_token("", &auth), None);
    }

    #[test]
    fn test_empty_admin_key_never_matches() {
        let auth = AuthConfig {
            admin_key: Some(String::new()),
            api_keys: vec![],
        };
        assert_eq!(Requester::from_token("", &auth), None);
    }

    #[test]
    fn test_authorize() {
        let mut link = LinkMapping::new("abc", "https://example.com");
        link.owner = Some("alice".to_string());

        assert!(Requester::Admin.authorize(&link).is_ok());
        assert!(Requester::Owner("alice".into()).authorize(&link).is_ok());
        assert!(matches!(
            Requester::Owner("bob".into()).authorize(&link),
            Err(ShortlinkError::Forbidden(_))
        ));

        // 无所有者的链接只有管理员可以操作
        link.owner = None;
        assert!(Requester::Admin.authorize(&link).is_ok());
        assert!(Requester::Owner("alice".into()).authorize(&link).is_err());
    }
}
