// ==========================================
// 商品主码系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 商品主码发放与外部系统同步
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 主码发放规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 同步层 - 外部系统推送
pub mod sync;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BatchStatus, ExternalProductMap, ImageKind, ImportReport, OptionValueIntent, Product,
    ProductImage, ProductIntent, ProductOptionValue, PushCandidate, PushOutcome, PushStatus,
    PushSummary, RowError, RowErrorCode, RowWarning, SourceOfTruth, SyncDirection,
    EXTERNAL_SYSTEM,
};

// 导入链路
pub use importer::{
    parse_category_ids, CsvParser, ExcelParser, FileParser, ImportError, ProductImporter,
    ProductImporterImpl, UniversalFileParser,
};

// 仓储
pub use repository::{
    ExternalMapRepository, ExternalMapRepositoryImpl, PersistOutcome, ProductImportRepository,
    ProductImportRepositoryImpl, RepositoryError,
};

// 引擎
pub use engine::{format_master_code, IssuedCode, MAX_SEQUENCE};

// 同步链路
pub use sync::{
    create_sync_client, ExternalSyncClient, MinIntervalLimiter, PushBatchRunner, PushOptions,
    ResultsLog, RetryPolicy, SyncError,
};

// 配置
pub use config::{ConfigManager, ExternalApiConfig, SyncConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "商品主码系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
