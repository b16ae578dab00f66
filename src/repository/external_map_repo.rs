// ==========================================
// 商品主码系统 - 外部映射 Repository
// ==========================================
// 职责: 推送候选项选择 + 同步状态翻转（幂等标记）
// 红线: 推送失败绝不触碰同步状态，保证该项下次仍被选中
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{ExternalProductMap, PushCandidate, SourceOfTruth, SyncDirection};
use crate::repository::error::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ExternalMapRepository Trait
// ==========================================
#[async_trait]
pub trait ExternalMapRepository: Send + Sync {
    /// 选择推送候选项
    ///
    /// # 参数
    /// - system: 目标外部系统
    /// - only_unsynced: 仅选择未成功推送过的映射
    ///   （last_sync_direction ≠ PUSH 或 last_synced_at 为空）
    /// - limit: 最大候选数
    ///
    /// # 排序
    /// - last_synced_at 升序（空值优先），再按建档时间
    async fn select_push_candidates(
        &self,
        system: &str,
        only_unsynced: bool,
        limit: usize,
    ) -> Result<Vec<PushCandidate>, Box<dyn Error>>;

    /// 推送成功后的幂等标记翻转:
    /// last_sync_direction=PUSH, last_synced_at=now, source_of_truth=MASTER
    async fn mark_pushed(
        &self,
        system: &str,
        external_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn Error>>;

    /// 按 (system, external_id) 读取完整映射记录
    async fn find_by_external_id(
        &self,
        system: &str,
        external_id: &str,
    ) -> Result<Option<ExternalProductMap>, Box<dyn Error>>;
}

// ==========================================
// ExternalMapRepositoryImpl
// ==========================================
pub struct ExternalMapRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ExternalMapRepositoryImpl {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ExternalMapRepository for ExternalMapRepositoryImpl {
    async fn select_push_candidates(
        &self,
        system: &str,
        only_unsynced: bool,
        limit: usize,
    ) -> Result<Vec<PushCandidate>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT m.external_id, m.product_id, p.master_code
                FROM external_product_map m
                JOIN product p ON p.product_id = m.product_id
                WHERE m.system = ?1
                  AND (?2 = 0
                       OR m.last_sync_direction IS NULL
                       OR m.last_sync_direction <> ?3
                       OR m.last_synced_at IS NULL)
                ORDER BY m.last_synced_at ASC NULLS FIRST, m.created_at ASC
                LIMIT ?4
                "#,
            )
            .map_err(RepositoryError::from)?;

        let candidates = stmt
            .query_map(
                params![
                    system,
                    only_unsynced,
                    SyncDirection::Push.as_str(),
                    limit as i64
                ],
                |row| {
                    Ok(PushCandidate {
                        external_id: row.get(0)?,
                        product_id: row.get(1)?,
                        master_code: row.get(2)?,
                    })
                },
            )
            .map_err(RepositoryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)?;

        Ok(candidates)
    }

    async fn mark_pushed(
        &self,
        system: &str,
        external_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let updated = conn
            .execute(
                r#"
                UPDATE external_product_map
                SET last_sync_direction = ?1,
                    last_synced_at = ?2,
                    source_of_truth = ?3
                WHERE system = ?4 AND external_id = ?5
                "#,
                params![
                    SyncDirection::Push.as_str(),
                    synced_at,
                    SourceOfTruth::Master.as_str(),
                    system,
                    external_id,
                ],
            )
            .map_err(RepositoryError::from)?;

        if updated == 0 {
            return Err(Box::new(RepositoryError::NotFound {
                entity: "external_product_map".to_string(),
                id: format!("{}/{}", system, external_id),
            }));
        }

        Ok(())
    }

    async fn find_by_external_id(
        &self,
        system: &str,
        external_id: &str,
    ) -> Result<Option<ExternalProductMap>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let row = conn
            .query_row(
                r#"
                SELECT map_id, system, external_id, product_id, external_url,
                       source_of_truth, raw_snapshot, last_sync_direction,
                       last_synced_at, created_at
                FROM external_product_map
                WHERE system = ?1 AND external_id = ?2
                "#,
                params![system, external_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, Option<DateTime<Utc>>>(8)?,
                        row.get::<_, DateTime<Utc>>(9)?,
                    ))
                },
            )
            .optional()
            .map_err(RepositoryError::from)?;

        let Some((
            map_id,
            system,
            external_id,
            product_id,
            external_url,
            sot_raw,
            raw_snapshot,
            direction_raw,
            last_synced_at,
            created_at,
        )) = row
        else {
            return Ok(None);
        };

        let source_of_truth = SourceOfTruth::parse(&sot_raw).ok_or_else(|| {
            RepositoryError::DatabaseQueryError(format!("未知权威方标记: {}", sot_raw))
        })?;
        let last_sync_direction = match direction_raw {
            Some(raw) => Some(SyncDirection::parse(&raw).ok_or_else(|| {
                RepositoryError::DatabaseQueryError(format!("未知同步方向: {}", raw))
            })?),
            None => None,
        };

        Ok(Some(ExternalProductMap {
            map_id,
            system,
            external_id,
            product_id,
            external_url,
            source_of_truth,
            raw_snapshot,
            last_sync_direction,
            last_synced_at,
            created_at,
        }))
    }
}
