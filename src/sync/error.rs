// ==========================================
// 商品主码系统 - 同步模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 同步模块错误类型
#[derive(Error, Debug)]
pub enum SyncError {
    // ===== 配置错误 =====
    #[error("速率配置无效: 每秒 {0} 次（必须为正数）")]
    InvalidRate(u32),

    // ===== 凭证错误 =====
    #[error("凭证获取失败: {0}")]
    CredentialError(String),

    // ===== 调用错误 =====
    #[error("外部平台返回非 2xx: status={status}, body={body}")]
    HttpStatus { status: u16, body: String },

    #[error("外部平台调用超时（{timeout_ms}ms）")]
    Timeout { timeout_ms: u64 },

    #[error("外部平台调用失败: {0}")]
    Transport(String),
}

/// Result 类型别名
pub type SyncResult<T> = Result<T, SyncError>;
