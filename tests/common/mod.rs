//! 集成测试共用的存储替身与装配函数
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tempfile::TempDir;

use go_short_link::cache::{CompositeCacheTrait, create_cache};
use go_short_link::config::{ApiKeyConfig, AuthConfig, CacheConfig, DatabaseConfig, StaticConfig};
use go_short_link::errors::{Result, ShortlinkError};
use go_short_link::generator::CodeGenerator;
use go_short_link::services::{LinkService, Resolver};
use go_short_link::storage::{LinkMapping, LinkPage, LinkPatch, LinkStore, SeaOrmStorage};

pub const ADMIN_KEY: &str = "admin-secret-key";
pub const ALICE_KEY: &str = "alice-key-0001";
pub const BOB_KEY: &str = "bob-key-0002";

/// 内存存储，可切换为故障或慢速模式
#[derive(Default)]
pub struct MemoryStore {
    links: Mutex<HashMap<String, LinkMapping>>,
    failing: AtomicBool,
    delay_ms: AtomicUsize,
    gets: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// 回源次数
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// 绕过服务层直接写入（模拟外部修改）
    pub fn put(&self, link: LinkMapping) {
        self.links.lock().insert(link.code.clone(), link);
    }

    async fn check(&self) -> Result<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShortlinkError::store_unavailable("connection refused"));
        }
        Ok(())
    }

    fn modify(
        &self,
        code: &str,
        f: impl FnOnce(&mut LinkMapping),
    ) -> Result<LinkMapping> {
        let mut links = self.links.lock();
        let link = links
            .get_mut(code)
            .ok_or_else(|| ShortlinkError::not_found(format!("Link '{}' not found", code)))?;
        f(link);
        link.updated_at = Utc::now();
        Ok(link.clone())
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn get(&self, code: &str) -> Result<Option<LinkMapping>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        Ok(self.links.lock().get(code).cloned())
    }

    async fn insert(&self, link: &LinkMapping) -> Result<()> {
        self.check().await?;
        let mut links = self.links.lock();
        if links.contains_key(&link.code) {
            return Err(ShortlinkError::conflict(format!(
                "Short code '{}' already exists",
                link.code
            )));
        }
        links.insert(link.code.clone(), link.clone());
        Ok(())
    }

    async fn update(&self, code: &str, patch: &LinkPatch) -> Result<LinkMapping> {
        self.check().await?;
        self.modify(code, |link| {
            if let Some(target) = &patch.target {
                link.target = target.clone();
            }
            if let Some(expires_at) = patch.expires_at {
                link.expires_at = expires_at;
            }
        })
    }

    async fn set_disabled(&self, code: &str, disabled: bool) -> Result<LinkMapping> {
        self.check().await?;
        self.modify(code, |link| link.disabled = disabled)
    }

    async fn count(&self) -> Result<u64> {
        self.check().await?;
        Ok(self.links.lock().len() as u64)
    }

    async fn load_active(&self, limit: u64) -> Result<Vec<LinkMapping>> {
        self.check().await?;
        let now = Utc::now();
        Ok(self
            .links
            .lock()
            .values()
            .filter(|l| !l.disabled && !l.is_expired(now))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_by_owner(
        &self,
        owner: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<LinkPage> {
        self.check().await?;
        let mut items: Vec<LinkMapping> = self
            .links
            .lock()
            .values()
            .filter(|l| owner.is_none() || l.owner.as_deref() == owner)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len() as u64;
        let page = page.max(1);
        let items = items
            .into_iter()
            .skip(((page - 1) * page_size) as usize)
            .take(page_size as usize)
            .collect();
        Ok(LinkPage {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.check().await
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

pub fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.auth = AuthConfig {
        admin_key: Some(ADMIN_KEY.to_string()),
        api_keys: vec![
            ApiKeyConfig {
                owner: "alice".to_string(),
                key: ALICE_KEY.to_string(),
            },
            ApiKeyConfig {
                owner: "bob".to_string(),
                key: BOB_KEY.to_string(),
            },
        ],
    };
    config.routing.resolve_timeout_ms = 200;
    config.cache = CacheConfig {
        warmup_limit: 0,
        ..CacheConfig::default()
    };
    config
}

/// 由同一份存储与缓存装配出的服务
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<dyn CompositeCacheTrait>,
    pub link_service: Arc<LinkService>,
    pub resolver: Arc<Resolver>,
    pub config: StaticConfig,
}

pub fn harness_with(config: StaticConfig) -> Harness {
    let store = MemoryStore::new();
    let cache = create_cache(&config.cache);
    let dyn_store: Arc<dyn LinkStore> = store.clone();
    let generator = CodeGenerator::new(
        &config.generator,
        config.routing.ignore_case,
        config.routing.reserved_segments(),
    );
    let link_service = Arc::new(LinkService::new(
        dyn_store.clone(),
        cache.clone(),
        generator,
        &config.routing,
    ));
    let resolver = Arc::new(Resolver::new(dyn_store, cache.clone(), &config.routing));
    Harness {
        store,
        cache,
        link_service,
        resolver,
        config,
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

/// 临时目录中的 SQLite 存储；返回的 `TempDir` 必须与存储同生命周期
pub async fn sqlite_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("links_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let config = DatabaseConfig {
        database_url: db_url.clone(),
        ..DatabaseConfig::default()
    };
    let storage = SeaOrmStorage::new(&db_url, "sqlite", &config)
        .await
        .expect("Failed to create storage");
    (Arc::new(storage), temp_dir)
}

impl Harness {
    pub fn app_services(&self) -> go_short_link::runtime::modes::server::AppServices {
        go_short_link::runtime::modes::server::AppServices {
            store: self.store.clone(),
            cache: self.cache.clone(),
            link_service: self.link_service.clone(),
            resolver: self.resolver.clone(),
            hits: None,
            start_time: go_short_link::api::services::AppStartTime {
                start_datetime: Utc::now(),
            },
        }
    }
}
