// ==========================================
// 商品主码系统 - 模拟同步客户端
// ==========================================
// 职责: 无外部凭据时的本地替身，带 50-200ms 模拟延迟，总是成功
// 说明: 延迟由 external_id 哈希导出，免引入随机数依赖且可复现
// ==========================================

use crate::sync::client::ExternalSyncClient;
use crate::sync::error::SyncError;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

const MIN_LATENCY_MS: u64 = 50;
const MAX_LATENCY_MS: u64 = 200;

pub struct SimulatedSyncClient;

impl SimulatedSyncClient {
    pub fn new() -> Self {
        Self
    }

    fn latency_for(external_id: &str) -> Duration {
        let mut hasher = DefaultHasher::new();
        external_id.hash(&mut hasher);
        let span = MAX_LATENCY_MS - MIN_LATENCY_MS + 1;
        Duration::from_millis(MIN_LATENCY_MS + hasher.finish() % span)
    }
}

impl Default for SimulatedSyncClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalSyncClient for SimulatedSyncClient {
    async fn update_code(&self, external_id: &str, master_code: &str) -> Result<(), SyncError> {
        let latency = Self::latency_for(external_id);
        sleep(latency).await;

        debug!(
            external_id,
            master_code,
            latency_ms = latency.as_millis() as u64,
            "模拟推送完成"
        );
        Ok(())
    }
}
