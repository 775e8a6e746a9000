//! 点击计数管理器
//!
//! - 高并发累加（DashMap，重定向路径无锁）
//! - 定时刷盘与阈值触发刷盘
//! - 刷盘失败时把数据还回缓冲区

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use super::HitSink;

struct HitBuffer {
    data: DashMap<Arc<str>, usize>,
    /// 缓冲区中的总点击数（用于阈值判断）
    total: AtomicUsize,
    flush_lock: Mutex<()>,
    /// 已有阈值刷盘任务在排队
    flush_pending: AtomicBool,
}

impl HitBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            total: AtomicUsize::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    fn increment(&self, code: &str) -> usize {
        // 热点短码走 get_mut，避免每次分配 Arc
        if let Some(mut entry) = self.data.get_mut(code) {
            *entry += 1;
        } else {
            self.data
                .entry(Arc::from(code))
                .and_modify(|v| *v += 1)
                .or_insert(1);
        }
        self.total.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 只移除快照中的 key，窗口期内新增的计数留到下一轮
    fn drain(&self) -> Vec<(String, usize)> {
        let keys: Vec<Arc<str>> = self.data.iter().map(|r| r.key().clone()).collect();

        let mut updates = Vec::with_capacity(keys.len());
        let mut removed = 0;
        for key in keys {
            if let Some((k, v)) = self.data.remove(&key) {
                removed += v;
                updates.push((k.to_string(), v));
            }
        }

        if removed > 0 {
            self.total
                .fetch_update(Ordering::Release, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(removed))
                })
                .ok();
        }

        updates
    }

    fn restore(&self, updates: Vec<(String, usize)>) {
        let mut restored = 0;
        for (k, v) in updates {
            *self.data.entry(Arc::from(k.as_str())).or_insert(0) += v;
            restored += v;
        }
        self.total.fetch_add(restored, Ordering::Relaxed);
    }

    fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

/// 点击计数器
///
/// 可廉价克隆，所有克隆共享同一个缓冲区。
#[derive(Clone)]
pub struct HitCounter {
    buffer: Arc<HitBuffer>,
    sink: Arc<dyn HitSink>,
    flush_interval: Duration,
    max_buffered: usize,
}

impl HitCounter {
    pub fn new(sink: Arc<dyn HitSink>, flush_interval: Duration, max_buffered: usize) -> Self {
        Self {
            buffer: Arc::new(HitBuffer::new()),
            sink,
            flush_interval,
            max_buffered,
        }
    }

    /// 记录一次点击；达到阈值时在后台触发一次刷盘
    pub fn increment(&self, code: &str) {
        let current = self.buffer.increment(code);
        trace!("HitCounter: buffered hits = {}", current);

        if current >= self.max_buffered
            && self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
        {
            let buffer = Arc::clone(&self.buffer);
            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                if let Ok(_guard) = buffer.flush_lock.try_lock() {
                    Self::flush_buffer(&buffer, &sink).await;
                }
                buffer.flush_pending.store(false, Ordering::Release);
            });
        }
    }

    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("HitCounter: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// 等待进行中的刷盘结束后再刷一次（停机时调用）
    pub async fn flush(&self) {
        debug!("HitCounter: Manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    async fn flush_buffer(buffer: &HitBuffer, sink: &Arc<dyn HitSink>) {
        let updates = buffer.drain();
        if updates.is_empty() {
            return;
        }

        let count = updates.len();
        match sink.flush_hits(updates.clone()).await {
            Ok(()) => debug!("HitCounter: flushed {} entries", count),
            Err(e) => {
                buffer.restore(updates);
                warn!(
                    "HitCounter: flush_hits failed: {}, {} entries restored to buffer",
                    e, count
                );
            }
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.total()
    }
}
