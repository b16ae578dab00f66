// ==========================================
// 商品主码系统 - 商品导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 逐行校验 → 单行原子落库 → 合并报告
// 红线: 行级失败记录后继续（部分失败语义），只有顶层失败中止整批
// ==========================================

use crate::domain::{BatchStatus, ImportReport};
use crate::importer::product_importer_trait::{FileParser, ProductImporter, RowValidator};
use crate::importer::row_validator::RowValidation;
use crate::repository::{PersistOutcome, ProductImportRepository};
use chrono::Utc;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ProductImporterImpl - 导入批次运行器
// ==========================================
pub struct ProductImporterImpl<R>
where
    R: ProductImportRepository,
{
    // 数据访问层
    import_repo: R,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    row_validator: Box<dyn RowValidator>,

    // 目标外部系统标识
    system: String,
}

impl<R> ProductImporterImpl<R>
where
    R: ProductImportRepository,
{
    /// 创建新的 ProductImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - file_parser: 文件解析器
    /// - row_validator: 行校验器
    /// - system: 外部系统标识（写入映射记录）
    pub fn new(
        import_repo: R,
        file_parser: Box<dyn FileParser>,
        row_validator: Box<dyn RowValidator>,
        system: String,
    ) -> Self {
        Self {
            import_repo,
            file_parser,
            row_validator,
            system,
        }
    }
}

#[async_trait::async_trait]
impl<R> ProductImporter for ProductImporterImpl<R>
where
    R: ProductImportRepository + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        allow_existing: bool,
    ) -> Result<ImportReport, Box<dyn Error>> {
        let started_at = Utc::now();
        let batch_id = Uuid::new_v4().to_string();
        let file = file_path.as_ref().display().to_string();

        info!(batch_id = %batch_id, file = %file, allow_existing, "开始导入商品数据");

        // === 步骤 1: 解析文件（顶层失败在此中止整批）===
        let raw_rows = self.file_parser.parse_to_raw_rows(file_path.as_ref())?;
        let total_rows = raw_rows.len();
        info!(total_rows, "文件解析完成");

        // === 步骤 2: 逐行 校验 → 落库 ===
        // 单一顺序工作者: 行号记账与进度报告保持确定性
        let mut processed = 0usize;
        let mut skipped_existing = 0usize;
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        for (idx, row) in raw_rows.iter().enumerate() {
            // 报告行号 1 起算且包含表头行，首个数据行为 2
            let row_number = idx + 2;

            let intent = match self.row_validator.validate_row(row, row_number) {
                RowValidation::Valid {
                    intent,
                    warnings: row_warnings,
                } => {
                    warnings.extend(row_warnings);
                    intent
                }
                RowValidation::Invalid(err) => {
                    warn!(row_number, code = ?err.code, message = %err.message, "行校验失败");
                    errors.push(err);
                    continue;
                }
            };

            // 单行原子落库单元（映射查重 + 发码 + 冲突复核 + 写入）
            match self
                .import_repo
                .persist_intent(&self.system, &intent, allow_existing)
                .await?
            {
                PersistOutcome::Created { master_code } => {
                    debug!(row_number, external_id = %intent.external_id, master_code = %master_code, "商品建档完成");
                    processed += 1;
                }
                PersistOutcome::SkippedExisting => {
                    debug!(row_number, external_id = %intent.external_id, "映射已存在，跳过");
                    skipped_existing += 1;
                }
                PersistOutcome::Rejected(err) => {
                    warn!(row_number, code = ?err.code, message = %err.message, "行落库被拒绝");
                    errors.push(err);
                }
            }
        }

        // === 步骤 3: 合并报告 ===
        let status = if errors.is_empty() {
            BatchStatus::Success
        } else {
            BatchStatus::Partial
        };

        let report = ImportReport {
            started_at,
            finished_at: Utc::now(),
            file,
            allow_existing,
            total_rows,
            processed,
            skipped_existing,
            warnings,
            errors,
            status,
        };

        // === 步骤 4: 批次审计入库 ===
        self.import_repo
            .insert_import_batch(&batch_id, &report)
            .await?;

        info!(
            batch_id = %batch_id,
            total = report.total_rows,
            processed = report.processed,
            skipped = report.skipped_existing,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            status = ?report.status,
            "商品数据导入完成"
        );

        Ok(report)
    }
}
