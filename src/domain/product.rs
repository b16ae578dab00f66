// ==========================================
// 商品主码系统 - 商品领域模型
// ==========================================
// 红线: 主码一经发放不可变更，issued_category_id 随之冻结
// 用途: 导入层写入，同步层只读
// 对齐: db.rs product / product_option_value / product_image 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 商品主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    // ===== 主键 =====
    pub product_id: String, // UUID v4

    // ===== 主码信息 =====
    pub master_code: String,         // 主码，全局唯一，{类目}-{5位序号}
    pub issued_category_id: String,  // 发码类目（发放时冻结，不可变）
    pub current_category_id: String, // 当前类目（可随商品移动变化）
    pub category_ids: Vec<String>,   // 有序去重类目列表，至少一个

    // ===== 商品信息 =====
    pub name: String,                // 商品名
    pub price_sale: i64,             // 销售价（整数，>= 0）
    pub sale_status: Option<String>, // 销售状态（源字段，原样保留）
    pub display_status: bool,        // 是否前台展示
    pub description: Option<String>, // 商品描述

    // ===== 库存信息 =====
    pub inventory_track: bool,  // 是否启用库存跟踪
    pub stock_qty: Option<i64>, // 库存数量（仅 inventory_track=true 时非空）

    // ===== 选项信息 =====
    pub option_name: Option<String>, // 选项名（如"颜色"），无选项时为空

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
}

// ==========================================
// ProductOptionValue - 商品选项值
// ==========================================
// 约束: (product_id, option_name, canonical_value) 唯一
// canonical_value = uppercase(normalize(display_value))
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOptionValue {
    pub product_id: String,
    pub option_name: String,
    pub display_value: String,   // 原始展示值（仅做空白归一）
    pub canonical_value: String, // 规范值（去重口径）
}

/// 商品图片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Thumbnail,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Thumbnail => "THUMBNAIL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "THUMBNAIL" => Some(ImageKind::Thumbnail),
            _ => None,
        }
    }
}

// ==========================================
// ProductImage - 商品图片
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub image_id: i64,
    pub product_id: String,
    pub kind: ImageKind,
    pub url: String,
}

// ==========================================
// ProductIntent - 行校验通过后的落库意图
// ==========================================
// 用途: 行校验器的成功输出，导入执行器的持久化输入
// 说明: raw_row 保留原始行的逐字快照，写入 external_product_map.raw_snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductIntent {
    pub row_number: usize,   // 报告行号（1 起算，含表头行）
    pub external_id: String, // 外部平台商品号

    pub name: String,
    pub category_ids: Vec<String>,
    pub issued_category_id: String, // = category_ids[0]
    pub price_sale: i64,
    pub inventory_track: bool,
    pub stock_qty: Option<i64>,
    pub sale_status: Option<String>,
    pub display_status: bool,
    pub description: Option<String>,

    pub option_name: Option<String>,
    pub option_values: Vec<OptionValueIntent>,

    pub thumbnail_url: Option<String>,
    pub external_url: Option<String>,

    /// 原始行快照（审计用，逐字保留）
    pub raw_row: serde_json::Value,
}

/// 单个选项值意图（按 canonical 去重后保留首个出现的展示值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValueIntent {
    pub display_value: String,
    pub canonical_value: String,
}
