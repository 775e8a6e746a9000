use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::{self, CacheEntry, CompositeCacheTrait};
use crate::config::StaticConfig;
use crate::generator::CodeGenerator;
use crate::hits::{HitCounter, HitSink};
use crate::services::{LinkService, Resolver};
use crate::storage::{LinkStore, SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub store: Arc<dyn LinkStore>,
    pub cache: Arc<dyn CompositeCacheTrait>,
    pub link_service: Arc<LinkService>,
    pub resolver: Arc<Resolver>,
    pub hits: Option<HitCounter>,
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、点击计数和两个服务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    let store: Arc<dyn LinkStore> = storage.clone();
    info!("Using storage backend: {}", store.backend_name());

    let cache = cache::create_cache(&config.cache);
    if config.cache.enabled && config.cache.warmup_limit > 0 {
        match store.load_active(config.cache.warmup_limit).await {
            Ok(links) => {
                let entries: Vec<CacheEntry> = links.iter().map(CacheEntry::from_mapping).collect();
                info!("Warming cache with {} active links", entries.len());
                cache.warm(entries);
            }
            // 预热失败不影响启动，冷缓存会按需回源
            Err(e) => warn!("Cache warmup failed (non-fatal): {}", e),
        }
    }

    let hits = if config.hits.enabled {
        let sink: Arc<dyn HitSink> = storage.clone();
        let counter = HitCounter::new(
            sink,
            Duration::from_secs(config.hits.flush_interval_secs.max(1)),
            config.hits.max_buffered.max(1),
        );

        let counter_for_task = counter.clone();
        tokio::spawn(async move {
            counter_for_task.start_background_task().await;
        });

        debug!(
            "HitCounter initialized with {} seconds and {} max buffered hits",
            config.hits.flush_interval_secs, config.hits.max_buffered
        );
        Some(counter)
    } else {
        warn!("Hit counting is disabled in configuration");
        None
    };

    let generator = CodeGenerator::new(
        &config.generator,
        config.routing.ignore_case,
        config.routing.reserved_segments(),
    );
    debug!("Code generator ready (length {})", generator.length());

    let link_service = Arc::new(LinkService::new(
        store.clone(),
        cache.clone(),
        generator,
        &config.routing,
    ));

    let resolver = Resolver::new(store.clone(), cache.clone(), &config.routing);
    let resolver = Arc::new(match &hits {
        Some(counter) => resolver.with_hits(counter.clone()),
        None => resolver,
    });

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        store,
        cache,
        link_service,
        resolver,
        hits,
    })
}
