// ==========================================
// 商品主码系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含校验规则，只做数据访问
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod error;
pub mod external_map_repo;
pub mod product_import_repo;
pub mod product_import_repo_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use external_map_repo::{ExternalMapRepository, ExternalMapRepositoryImpl};
pub use product_import_repo::{PersistOutcome, ProductImportRepository};
pub use product_import_repo_impl::ProductImportRepositoryImpl;
