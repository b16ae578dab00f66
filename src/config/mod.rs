// ==========================================
// 商品主码系统 - 配置模块
// ==========================================

pub mod config_manager;
pub mod sync_config_trait;

pub use config_manager::{config_keys, ConfigManager, DEFAULT_TIMEOUT_MS};
pub use sync_config_trait::{ExternalApiConfig, SyncConfigReader};
