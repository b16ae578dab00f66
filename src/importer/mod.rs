// ==========================================
// 商品主码系统 - 导入层
// ==========================================
// 职责: 外部平台导出数据导入，商品建档与发码
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod canonicalizer;
pub mod category_parser;
pub mod error;
pub mod field_layout;
pub mod file_parser;
pub mod product_importer_impl;
pub mod product_importer_trait;
pub mod row_validator;

// 重导出核心类型
pub use canonicalizer::{canonicalize_option_value, dedupe_preserve_order, normalize_whitespace};
pub use category_parser::parse_category_ids;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use product_importer_impl::ProductImporterImpl;
pub use row_validator::{RowValidation, RowValidator as RowValidatorImpl};

// 重导出 Trait 接口
pub use product_importer_trait::{FileParser, ProductImporter, RowValidator};
