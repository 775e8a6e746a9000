/// 点击计数写回目标（聚合模式）
#[async_trait::async_trait]
pub trait HitSink: Send + Sync {
    async fn flush_hits(&self, updates: Vec<(String, usize)>) -> anyhow::Result<()>;
}
