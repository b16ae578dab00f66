// ==========================================
// 商品主码系统 - 领域层
// ==========================================
// 职责: 实体与类型定义，不含持久化与业务流程
// ==========================================

pub mod external_map;
pub mod product;
pub mod report;

// 重导出核心类型
pub use external_map::{
    ExternalProductMap, PushCandidate, SourceOfTruth, SyncDirection, EXTERNAL_SYSTEM,
};
pub use product::{
    ImageKind, OptionValueIntent, Product, ProductImage, ProductIntent, ProductOptionValue,
};
pub use report::{
    BatchStatus, ImportReport, PushOutcome, PushStatus, PushSummary, RowError, RowErrorCode,
    RowWarning,
};
