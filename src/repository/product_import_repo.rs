// ==========================================
// 商品主码系统 - 商品导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含校验规则）
// 红线: 单行落库是一个不可拆分的原子单元，映射查重、发码、
//       主码冲突复核、商品/选项/图片/映射写入要么全部成功要么全部回滚
// ==========================================

use crate::domain::{
    ImportReport, Product, ProductImage, ProductIntent, ProductOptionValue, RowError,
};
use async_trait::async_trait;
use std::error::Error;

/// 单行落库结果
#[derive(Debug, Clone)]
pub enum PersistOutcome {
    /// 新建成功（返回发放的主码）
    Created { master_code: String },
    /// (system, external_id) 映射已存在，按策略跳过
    SkippedExisting,
    /// 行级拒绝（EXISTS / MASTER_CODE_COLLISION / SEQUENCE_EXHAUSTED）
    Rejected(RowError),
}

// ==========================================
// ProductImportRepository Trait
// ==========================================
// 用途: 导入批次的持久化边界
// 实现者: ProductImportRepositoryImpl（rusqlite）
#[async_trait]
pub trait ProductImportRepository: Send + Sync {
    /// 单行原子落库单元
    ///
    /// 事务内步骤:
    /// 1. 按 (system, external_id) 查外部映射
    ///    - 已存在且 allow_existing=false → Rejected(EXISTS)
    ///    - 已存在且 allow_existing=true  → SkippedExisting（无副作用）
    /// 2. 发码（同事务内原子自增）
    /// 3. 主码对 product 表复核（防御性；冲突 = 计数器损坏，行级致命）
    /// 4. 写入 Product + OptionValues + 缩略图 + ExternalProductMap
    async fn persist_intent(
        &self,
        system: &str,
        intent: &ProductIntent,
        allow_existing: bool,
    ) -> Result<PersistOutcome, Box<dyn Error>>;

    /// 记录批次审计信息（报告原文一并入库）
    async fn insert_import_batch(
        &self,
        batch_id: &str,
        report: &ImportReport,
    ) -> Result<(), Box<dyn Error>>;

    /// 按主码读取商品主数据（主码全局唯一，至多一条）
    async fn find_product_by_master_code(
        &self,
        master_code: &str,
    ) -> Result<Option<Product>, Box<dyn Error>>;

    /// 读取商品的选项值（按写入顺序）
    async fn list_option_values(
        &self,
        product_id: &str,
    ) -> Result<Vec<ProductOptionValue>, Box<dyn Error>>;

    /// 读取商品的图片
    async fn list_images(&self, product_id: &str) -> Result<Vec<ProductImage>, Box<dyn Error>>;
}
