// ==========================================
// 商品主码系统 - 导入层 Trait 接口
// ==========================================
// 职责: 定义导入流水线各环节的接口（不包含实现）
// ==========================================

use crate::domain::ImportReport;
use crate::importer::error::ImportError;
use crate::importer::row_validator::RowValidation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 表格行源，产出"列名 → 原始单元格值"映射
// 实现者: CsvParser / ExcelParser / UniversalFileParser
pub trait FileParser: Send + Sync {
    fn parse_to_raw_rows(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, ImportError>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 单行状态机 RAW → PARSED → VALID-INTENT
// 实现者: RowValidator（row_validator.rs）
pub trait RowValidator: Send + Sync {
    /// 校验单行
    ///
    /// # 参数
    /// - row: 列名 → 原始单元格值
    /// - row_number: 报告行号（1 起算，含表头行）
    fn validate_row(&self, row: &HashMap<String, String>, row_number: usize) -> RowValidation;
}

// ==========================================
// ProductImporter Trait
// ==========================================
// 用途: 驱动整批导入并产出合并报告
// 实现者: ProductImporterImpl
#[async_trait]
pub trait ProductImporter: Send + Sync {
    /// 从导出文件导入商品数据
    ///
    /// # 参数
    /// - file_path: 导出文件路径（.csv/.xlsx/.xls）
    /// - allow_existing: 已存在映射的行按跳过处理（而非 EXISTS 错误）
    ///
    /// # 返回
    /// - Ok(ImportReport): 批次报告（含行级错误时 status=partial）
    /// - Err: 顶层失败（文件不可读、数据库不可用）
    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        allow_existing: bool,
    ) -> Result<ImportReport, Box<dyn Error>>;
}
