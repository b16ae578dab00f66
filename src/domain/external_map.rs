// ==========================================
// 商品主码系统 - 外部映射领域模型
// ==========================================
// 用途: 内部商品与外部平台商品号的一对一映射
// 红线: (system, external_id) 唯一，是推送幂等标记的唯一依据
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 目标外部系统标识（当前仅支持一种外部系统类型）
pub const EXTERNAL_SYSTEM: &str = "SHOP";

/// 最近一次同步方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncDirection {
    Push,
    Pull,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Push => "PUSH",
            SyncDirection::Pull => "PULL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "PUSH" => Some(SyncDirection::Push),
            "PULL" => Some(SyncDirection::Pull),
            _ => None,
        }
    }
}

/// 字段权威方：映射建立时为外部平台，推送成功后翻转为本系统
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceOfTruth {
    External,
    Master,
}

impl SourceOfTruth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOfTruth::External => "EXTERNAL",
            SourceOfTruth::Master => "MASTER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "EXTERNAL" => Some(SourceOfTruth::External),
            "MASTER" => Some(SourceOfTruth::Master),
            _ => None,
        }
    }
}

// ==========================================
// ExternalProductMap - 外部商品映射
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProductMap {
    pub map_id: i64,
    pub system: String,
    pub external_id: String,
    pub product_id: String,
    pub external_url: Option<String>,
    pub source_of_truth: SourceOfTruth,
    pub raw_snapshot: String, // 建档时的原始行快照（JSON 文本，不透明载荷）
    pub last_sync_direction: Option<SyncDirection>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// PushCandidate - 推送批次候选项
// ==========================================
// 用途: PushBatchRunner 的选择结果（映射 + 主码的最小投影）
#[derive(Debug, Clone)]
pub struct PushCandidate {
    pub external_id: String,
    pub product_id: String,
    pub master_code: String,
}
