// ==========================================
// 商品主码系统 - 外部同步客户端接口
// ==========================================
// 职责: 定义主码推送的外部客户端抽象 + 按配置选择实现的工厂
// 选择规则: base_url/client_id/client_secret/shop_no 任一缺失 → 模拟客户端
// ==========================================

use crate::config::SyncConfigReader;
use crate::sync::error::SyncError;
use crate::sync::networked::NetworkedSyncClient;
use crate::sync::simulated::SimulatedSyncClient;
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;
use tracing::info;

// ==========================================
// ExternalSyncClient Trait
// ==========================================
// 实现者: SimulatedSyncClient / NetworkedSyncClient
#[async_trait]
pub trait ExternalSyncClient: Send + Sync {
    /// 将主码写入外部系统的商品自定义码字段
    ///
    /// # 参数
    /// - external_id: 外部系统商品编号
    /// - master_code: 主码（如 CATE9-00001）
    async fn update_code(&self, external_id: &str, master_code: &str) -> Result<(), SyncError>;
}

/// 按配置构造外部同步客户端
///
/// # 返回
/// - 凭据齐全: NetworkedSyncClient（真实 HTTP 调用）
/// - 凭据缺失: SimulatedSyncClient（本地模拟，总是成功）
pub async fn create_sync_client(
    cfg: &dyn SyncConfigReader,
) -> Result<Arc<dyn ExternalSyncClient>, Box<dyn Error>> {
    match cfg.get_external_api_config().await? {
        Some(api_config) => {
            info!(base_url = %api_config.base_url, shop_no = %api_config.shop_no, "使用网络同步客户端");
            Ok(Arc::new(NetworkedSyncClient::new(api_config)?))
        }
        None => {
            info!("外部 API 凭据未配置，使用模拟同步客户端");
            Ok(Arc::new(SimulatedSyncClient::new()))
        }
    }
}
