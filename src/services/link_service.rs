//! Link ingestion service
//!
//! Every write goes to the store first, then synchronously invalidates the
//! cache entry for the code before returning to the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::cache::CompositeCacheTrait;
use crate::config::RoutingConfig;
use crate::errors::{Result, ShortlinkError};
use crate::generator::CodeGenerator;
use crate::services::Requester;
use crate::storage::{LinkMapping, LinkPage, LinkPatch, LinkStore};
use crate::utils::{TimeParser, is_valid_short_code, normalize_code, validate_url};

// ============ Request DTOs ============

/// Request to create a new link
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLinkRequest {
    pub target_url: String,
    /// Generated when absent or empty
    #[serde(default)]
    pub custom_code: Option<String>,
    /// RFC3339 or relative ("1d", "2h30m")
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Partial update. `expires_at: Some("")` clears the expiry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLinkRequest {
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

// ============ LinkService Implementation ============

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn CompositeCacheTrait>,
    generator: CodeGenerator,
    reserved: Vec<String>,
    ignore_case: bool,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn LinkStore>,
        cache: Arc<dyn CompositeCacheTrait>,
        generator: CodeGenerator,
        routing: &RoutingConfig,
    ) -> Self {
        Self {
            store,
            cache,
            generator,
            reserved: routing.reserved_segments(),
            ignore_case: routing.ignore_case,
        }
    }

    fn validate_target(target: &str) -> Result<String> {
        validate_url(target)
            .map(str::to_string)
            .map_err(|e| ShortlinkError::validation(e.to_string()))
    }

    fn validate_custom_code(&self, raw: &str) -> Result<String> {
        let code = normalize_code(raw, self.ignore_case);
        if !is_valid_short_code(&code) {
            return Err(ShortlinkError::validation(format!(
                "Invalid short code '{}'. Use 1-64 characters of letters, digits, '-' or '_'",
                raw
            )));
        }
        if self.reserved.iter().any(|r| r.eq_ignore_ascii_case(&code)) {
            return Err(ShortlinkError::validation(format!(
                "Short code '{}' conflicts with a reserved route",
                code
            )));
        }
        Ok(code)
    }

    /// Parse an expiry that must lie in the future
    fn parse_future_expiry(input: &str) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let at = TimeParser::parse_expire_time_at(input, now).map_err(ShortlinkError::validation)?;
        if at <= now {
            return Err(ShortlinkError::validation(format!(
                "Expiration time '{}' is in the past",
                input
            )));
        }
        Ok(at)
    }

    async fn load_authorized(&self, code: &str, requester: &Requester) -> Result<LinkMapping> {
        let code = normalize_code(code, self.ignore_case);
        let link = self
            .store
            .get(&code)
            .await?
            .ok_or_else(|| ShortlinkError::not_found(format!("Link '{}' not found", code)))?;
        requester.authorize(&link)?;
        Ok(link)
    }

    // ============ Operations ============

    pub async fn create_link(&self, req: CreateLinkRequest) -> Result<LinkMapping> {
        let target = Self::validate_target(&req.target_url)?;

        let custom_code = match req.custom_code.as_deref().filter(|c| !c.is_empty()) {
            Some(raw) => Some(self.validate_custom_code(raw)?),
            None => None,
        };

        let expires_at = match req.expires_at.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(Self::parse_future_expiry(s)?),
            None => None,
        };

        let mut template = LinkMapping::new(String::new(), target);
        template.expires_at = expires_at;
        template.owner = req.owner.filter(|o| !o.is_empty());

        let link = match custom_code {
            Some(code) => {
                template.code = code;
                self.store.insert(&template).await?;
                template
            }
            None => {
                let store = Arc::clone(&self.store);
                self.generator
                    .allocate(|code| {
                        let store = Arc::clone(&store);
                        let mut link = template.clone();
                        link.code = code;
                        async move {
                            store.insert(&link).await?;
                            Ok(link)
                        }
                    })
                    .await?
            }
        };

        // 清掉此前可能写入的负缓存
        self.cache.invalidate(&link.code);

        info!(
            "LinkService: created link '{}' -> '{}' (owner: {})",
            link.code,
            link.target,
            link.owner.as_deref().unwrap_or("-")
        );
        Ok(link)
    }

    pub async fn update_link(
        &self,
        code: &str,
        requester: &Requester,
        req: UpdateLinkRequest,
    ) -> Result<LinkMapping> {
        let existing = self.load_authorized(code, requester).await?;

        let mut patch = LinkPatch::default();
        if let Some(target) = req.target_url.as_deref() {
            patch.target = Some(Self::validate_target(target)?);
        }
        if let Some(expires) = req.expires_at.as_deref() {
            patch.expires_at = if expires.trim().is_empty() {
                Some(None)
            } else {
                Some(Some(Self::parse_future_expiry(expires)?))
            };
        }
        if patch.is_empty() {
            return Err(ShortlinkError::validation("Nothing to update"));
        }

        let updated = self.store.update(&existing.code, &patch).await;
        // 写入报错时结果可能已落库，同样需要失效
        self.cache.invalidate(&existing.code);
        let updated = updated?;

        info!(
            "LinkService: '{}' updated link '{}'",
            requester.display_name(),
            updated.code
        );
        Ok(updated)
    }

    pub async fn disable_link(&self, code: &str, requester: &Requester) -> Result<LinkMapping> {
        self.toggle(code, requester, true).await
    }

    pub async fn enable_link(&self, code: &str, requester: &Requester) -> Result<LinkMapping> {
        self.toggle(code, requester, false).await
    }

    async fn toggle(&self, code: &str, requester: &Requester, disabled: bool) -> Result<LinkMapping> {
        let existing = self.load_authorized(code, requester).await?;

        let result = self.store.set_disabled(&existing.code, disabled).await;
        self.cache.invalidate(&existing.code);
        let link = result?;

        info!(
            "LinkService: '{}' {} link '{}'",
            requester.display_name(),
            if disabled { "disabled" } else { "enabled" },
            link.code
        );
        Ok(link)
    }

    pub async fn get_link(&self, code: &str, requester: &Requester) -> Result<LinkMapping> {
        self.load_authorized(code, requester).await
    }

    pub async fn list_links(
        &self,
        requester: &Requester,
        page: u64,
        page_size: u64,
    ) -> Result<LinkPage> {
        self.store
            .list_by_owner(requester.owner_filter(), page, page_size)
            .await
    }
}
