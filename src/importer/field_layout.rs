// ==========================================
// 商品主码系统 - 导出文件列名契约
// ==========================================
// 职责: 外部平台导出文件的业务字段列名（对我方不透明的外部契约）
// 红线: 列名只在此处出现一次，校验器按常量匹配，不散落魔法字符串
// ==========================================

/// 外部平台商品号（必填）
pub const COL_PRODUCT_ID: &str = "product_no";

/// 商品名（必填）
pub const COL_PRODUCT_NAME: &str = "product_name";

/// 类目 id 串（逗号分隔，首个为发码类目）
pub const COL_CATEGORY_IDS: &str = "category_ids";

/// 销售价（可能带千分位分隔符）
pub const COL_PRICE_SALE: &str = "price_sale";

/// 库存跟踪标志（Y/N）
pub const COL_INVENTORY_TRACK: &str = "inventory_track";

/// 库存数量（主字段）
pub const COL_STOCK_QTY: &str = "stock_qty";

/// 库存数量（次级聚合字段，主字段缺失时回退）
pub const COL_STOCK_QTY_TOTAL: &str = "stock_qty_total";

/// 销售状态（原样保留）
pub const COL_SALE_STATUS: &str = "sale_status";

/// 前台展示标志（Y/N，缺失/无效按 N）
pub const COL_DISPLAY_STATUS: &str = "display_status";

/// 商品描述
pub const COL_DESCRIPTION: &str = "description";

/// 是否使用选项（Y/N）
pub const COL_OPTION_USED: &str = "option_used";

/// 选项名
pub const COL_OPTION_NAME: &str = "option_name";

/// 选项值串（逗号分隔）
pub const COL_OPTION_VALUES: &str = "option_values";

/// 缩略图地址
pub const COL_THUMBNAIL_URL: &str = "thumbnail_url";

/// 外部商品页地址
pub const COL_PRODUCT_URL: &str = "product_url";
