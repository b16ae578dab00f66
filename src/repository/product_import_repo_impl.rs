// ==========================================
// 商品主码系统 - 商品导入 Repository 实现
// ==========================================
// 存储: SQLite（rusqlite），连接经 db.rs 统一 PRAGMA
// 事务: 单行落库 = 一个事务；任何一步失败全部回滚
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{
    BatchStatus, ImageKind, ImportReport, Product, ProductImage, ProductIntent,
    ProductOptionValue, RowError, RowErrorCode, SourceOfTruth,
};
use crate::engine::code_issuer;
use crate::repository::error::RepositoryError;
use crate::repository::product_import_repo::{PersistOutcome, ProductImportRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::error::Error;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ProductImportRepositoryImpl
// ==========================================
pub struct ProductImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ProductImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（连接需已应用统一 PRAGMA）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务内执行单行落库（持锁调用）
    fn persist_intent_tx(
        tx: &Transaction,
        system: &str,
        intent: &ProductIntent,
        allow_existing: bool,
    ) -> Result<PersistOutcome, RepositoryError> {
        // === 步骤 1: 外部映射查重 ===
        let existing: Option<i64> = tx
            .query_row(
                "SELECT map_id FROM external_product_map WHERE system = ?1 AND external_id = ?2",
                params![system, intent.external_id],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            if allow_existing {
                return Ok(PersistOutcome::SkippedExisting);
            }
            return Ok(PersistOutcome::Rejected(RowError {
                row_number: intent.row_number,
                message: format!("外部商品号 {} 已存在映射", intent.external_id),
                code: RowErrorCode::Exists,
            }));
        }

        // === 步骤 2: 发码（同事务内原子自增）===
        let issued = match code_issuer::issue(tx, &intent.issued_category_id) {
            Ok(issued) => issued,
            Err(e @ RepositoryError::SequenceExhausted { .. }) => {
                return Ok(PersistOutcome::Rejected(RowError {
                    row_number: intent.row_number,
                    message: e.to_string(),
                    code: RowErrorCode::SequenceExhausted,
                }))
            }
            Err(e) => return Err(e),
        };

        // === 步骤 3: 主码冲突复核（防御性）===
        // 冲突说明计数器状态损坏，行级致命，绝不静默重新发号
        let collision: Option<String> = tx
            .query_row(
                "SELECT product_id FROM product WHERE master_code = ?1",
                params![issued.master_code],
                |row| row.get(0),
            )
            .optional()?;

        if collision.is_some() {
            return Ok(PersistOutcome::Rejected(RowError {
                row_number: intent.row_number,
                message: RepositoryError::MasterCodeCollision {
                    master_code: issued.master_code.clone(),
                }
                .to_string(),
                code: RowErrorCode::MasterCodeCollision,
            }));
        }

        // === 步骤 4: 写入商品 + 选项 + 缩略图 + 外部映射 ===
        let product_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        tx.execute(
            r#"
            INSERT INTO product (
                product_id, master_code, name, issued_category_id, current_category_id,
                category_ids, price_sale, inventory_track, stock_qty, sale_status,
                display_status, description, option_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                product_id,
                issued.master_code,
                intent.name,
                intent.issued_category_id,
                intent.issued_category_id, // 建档时当前类目 = 发码类目
                serde_json::to_string(&intent.category_ids)
                    .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?,
                intent.price_sale,
                intent.inventory_track,
                intent.stock_qty,
                intent.sale_status,
                intent.display_status,
                intent.description,
                intent.option_name,
                now,
            ],
        )?;

        if let Some(option_name) = &intent.option_name {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO product_option_value (
                    product_id, option_name, display_value, canonical_value
                ) VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for value in &intent.option_values {
                stmt.execute(params![
                    product_id,
                    option_name,
                    value.display_value,
                    value.canonical_value,
                ])?;
            }
        }

        if let Some(url) = &intent.thumbnail_url {
            tx.execute(
                "INSERT INTO product_image (product_id, kind, url) VALUES (?1, ?2, ?3)",
                params![product_id, ImageKind::Thumbnail.as_str(), url],
            )?;
        }

        tx.execute(
            r#"
            INSERT INTO external_product_map (
                system, external_id, product_id, external_url, source_of_truth,
                raw_snapshot, last_sync_direction, last_synced_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, ?7)
            "#,
            params![
                system,
                intent.external_id,
                product_id,
                intent.external_url,
                SourceOfTruth::External.as_str(),
                intent.raw_row.to_string(),
                now,
            ],
        )?;

        Ok(PersistOutcome::Created {
            master_code: issued.master_code,
        })
    }
}

#[async_trait]
impl ProductImportRepository for ProductImportRepositoryImpl {
    async fn persist_intent(
        &self,
        system: &str,
        intent: &ProductIntent,
        allow_existing: bool,
    ) -> Result<PersistOutcome, Box<dyn Error>> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let outcome = Self::persist_intent_tx(&tx, system, intent, allow_existing)?;

        // Rejected 时无可保留的写入（发码自增随回滚丢弃）
        match &outcome {
            PersistOutcome::Created { .. } => tx
                .commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?,
            PersistOutcome::SkippedExisting | PersistOutcome::Rejected(_) => drop(tx),
        }

        Ok(outcome)
    }

    async fn insert_import_batch(
        &self,
        batch_id: &str,
        report: &ImportReport,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let status = match report.status {
            BatchStatus::Success => "success",
            BatchStatus::Partial => "partial",
            BatchStatus::Failed => "failed",
        };

        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file, status, total_rows, processed, skipped_existing,
                error_rows, warning_rows, started_at, finished_at, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch_id,
                report.file,
                status,
                report.total_rows,
                report.processed,
                report.skipped_existing,
                report.errors.len(),
                report.warnings.len(),
                report.started_at,
                report.finished_at,
                serde_json::to_string(report)?,
            ],
        )
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_product_by_master_code(
        &self,
        master_code: &str,
    ) -> Result<Option<Product>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let row = conn
            .query_row(
                r#"
                SELECT product_id, master_code, issued_category_id, current_category_id,
                       category_ids, name, price_sale, sale_status, display_status,
                       description, inventory_track, stock_qty, option_name, created_at
                FROM product
                WHERE master_code = ?1
                "#,
                params![master_code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, bool>(8)?,
                        row.get::<_, Option<String>>(9)?,
                        row.get::<_, bool>(10)?,
                        row.get::<_, Option<i64>>(11)?,
                        row.get::<_, Option<String>>(12)?,
                        row.get::<_, DateTime<Utc>>(13)?,
                    ))
                },
            )
            .optional()
            .map_err(RepositoryError::from)?;

        let Some((
            product_id,
            master_code,
            issued_category_id,
            current_category_id,
            category_json,
            name,
            price_sale,
            sale_status,
            display_status,
            description,
            inventory_track,
            stock_qty,
            option_name,
            created_at,
        )) = row
        else {
            return Ok(None);
        };

        let category_ids: Vec<String> = serde_json::from_str(&category_json)
            .map_err(|e| RepositoryError::DatabaseQueryError(format!("类目列表解析失败: {}", e)))?;

        Ok(Some(Product {
            product_id,
            master_code,
            issued_category_id,
            current_category_id,
            category_ids,
            name,
            price_sale,
            sale_status,
            display_status,
            description,
            inventory_track,
            stock_qty,
            option_name,
            created_at,
        }))
    }

    async fn list_option_values(
        &self,
        product_id: &str,
    ) -> Result<Vec<ProductOptionValue>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT product_id, option_name, display_value, canonical_value
                FROM product_option_value
                WHERE product_id = ?1
                ORDER BY option_value_id
                "#,
            )
            .map_err(RepositoryError::from)?;

        let values = stmt
            .query_map(params![product_id], |row| {
                Ok(ProductOptionValue {
                    product_id: row.get(0)?,
                    option_name: row.get(1)?,
                    display_value: row.get(2)?,
                    canonical_value: row.get(3)?,
                })
            })
            .map_err(RepositoryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)?;

        Ok(values)
    }

    async fn list_images(&self, product_id: &str) -> Result<Vec<ProductImage>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT image_id, product_id, kind, url
                FROM product_image
                WHERE product_id = ?1
                ORDER BY image_id
                "#,
            )
            .map_err(RepositoryError::from)?;

        let rows = stmt
            .query_map(params![product_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(RepositoryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)?;

        let mut images = Vec::with_capacity(rows.len());
        for (image_id, product_id, kind_raw, url) in rows {
            let kind = ImageKind::parse(&kind_raw).ok_or_else(|| {
                RepositoryError::DatabaseQueryError(format!("未知图片类型: {}", kind_raw))
            })?;
            images.push(ProductImage {
                image_id,
                product_id,
                kind,
                url,
            });
        }

        Ok(images)
    }
}
