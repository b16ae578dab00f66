// ==========================================
// 商品主码系统 - 批次报告与推送结果模型
// ==========================================
// 说明: 报告与结果行是对外契约（JSON / JSON Lines），
//       字段名按契约使用 camelCase 序列化
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 行级错误类型码（对外契约，SCREAMING_SNAKE_CASE）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorCode {
    ProductId,
    ProductName,
    Category,
    Price,
    InventoryMismatch,
    OptionValues,
    Exists,
    MasterCodeCollision,
    /// 类目 5 位序号耗尽（既不回绕也不加宽，该行拒绝发码）
    SequenceExhausted,
    /// 顶层失败（文件不可读、数据库不可用等），报告中记一条 rowNumber=0 的条目
    BatchFailed,
}

/// 行级警告（不阻断该行落库）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowWarning {
    pub row_number: usize,
    pub message: String,
}

/// 行级错误（该行不落库，批次继续）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_number: usize,
    pub message: String,
    pub code: RowErrorCode,
}

/// 批次最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// 无行级错误
    Success,
    /// 部分行失败，其余成功落库
    Partial,
    /// 顶层失败（文件不可读、数据库不可用等），整批未执行
    Failed,
}

// ==========================================
// ImportReport - 导入批次报告（每次运行一份 JSON）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub file: String,
    pub allow_existing: bool,
    pub total_rows: usize,
    pub processed: usize,
    pub skipped_existing: usize,
    pub warnings: Vec<RowWarning>,
    pub errors: Vec<RowError>,
    pub status: BatchStatus,
}

impl ImportReport {
    /// 任一行级错误都要求进程以非零码退出（即使批次继续执行完）
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty() || matches!(self.status, BatchStatus::Failed)
    }
}

/// 推送结果行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushStatus {
    Success,
    Error,
}

// ==========================================
// PushOutcome - 推送结果行（JSON Lines，每项一条）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub timestamp: DateTime<Utc>,
    pub external_id: String,
    pub product_id: String,
    pub master_code: String,
    pub status: PushStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 推送批次汇总（所有已调度项结清后返回）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    pub selected: usize,
    pub pushed: usize,
    pub failed: usize,
    pub skipped_dry_run: usize,
}
