// ==========================================
// 商品主码系统 - 同步模块
// ==========================================
// 职责: 主码向外部系统的推送（客户端、限速、重试、结果日志、批次执行）
// ==========================================

pub mod client;
pub mod error;
pub mod networked;
pub mod push_runner;
pub mod rate_limiter;
pub mod results_log;
pub mod retry;
pub mod simulated;

pub use client::{create_sync_client, ExternalSyncClient};
pub use error::{SyncError, SyncResult};
pub use networked::NetworkedSyncClient;
pub use push_runner::{PushBatchRunner, PushOptions};
pub use rate_limiter::MinIntervalLimiter;
pub use results_log::ResultsLog;
pub use retry::RetryPolicy;
pub use simulated::SimulatedSyncClient;
