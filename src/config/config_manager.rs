// ==========================================
// 商品主码系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::sync_config_trait::SyncConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 读取非空配置值（空字符串视同未配置）
    fn get_non_empty_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

// ==========================================
// SyncConfigReader Trait 实现
// ==========================================
#[async_trait]
impl SyncConfigReader for ConfigManager {
    async fn get_base_url(&self) -> Result<Option<String>, Box<dyn Error>> {
        // 尾部斜杠统一去除，路径拼接时再补
        Ok(self
            .get_non_empty_value(config_keys::EXTERNAL_API_BASE_URL)?
            .map(|v| v.trim_end_matches('/').to_string()))
    }

    async fn get_client_id(&self) -> Result<Option<String>, Box<dyn Error>> {
        self.get_non_empty_value(config_keys::EXTERNAL_API_CLIENT_ID)
    }

    async fn get_client_secret(&self) -> Result<Option<String>, Box<dyn Error>> {
        self.get_non_empty_value(config_keys::EXTERNAL_API_CLIENT_SECRET)
    }

    async fn get_shop_no(&self) -> Result<Option<String>, Box<dyn Error>> {
        self.get_non_empty_value(config_keys::EXTERNAL_API_SHOP_NO)
    }

    async fn get_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_value(config_keys::EXTERNAL_API_TIMEOUT_MS)?;
        Ok(value
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

/// 默认单次调用超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 外部 API 接入
    pub const EXTERNAL_API_BASE_URL: &str = "external_api/base_url";
    pub const EXTERNAL_API_CLIENT_ID: &str = "external_api/client_id";
    pub const EXTERNAL_API_CLIENT_SECRET: &str = "external_api/client_secret";
    pub const EXTERNAL_API_SHOP_NO: &str = "external_api/shop_no";
    pub const EXTERNAL_API_TIMEOUT_MS: &str = "external_api/timeout_ms";
}
