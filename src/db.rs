// ==========================================
// 商品主码系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供 schema 引导（CREATE TABLE IF NOT EXISTS），供首次运行与测试使用
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 约束说明：
/// - product.master_code 全局唯一（主码唯一性的最终防线）
/// - external_product_map (system, external_id) 唯一（幂等标记的查找键）
/// - code_sequence 为共享计数器状态，只允许"原子自增并读取"一种写法
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS product (
            product_id          TEXT PRIMARY KEY,
            master_code         TEXT NOT NULL UNIQUE,
            name                TEXT NOT NULL,
            issued_category_id  TEXT NOT NULL,
            current_category_id TEXT NOT NULL,
            category_ids        TEXT NOT NULL,
            price_sale          INTEGER NOT NULL CHECK (price_sale >= 0),
            inventory_track     INTEGER NOT NULL,
            stock_qty           INTEGER,
            sale_status         TEXT,
            display_status      INTEGER NOT NULL,
            description         TEXT,
            option_name         TEXT,
            created_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product_option_value (
            option_value_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id      TEXT NOT NULL REFERENCES product(product_id) ON DELETE CASCADE,
            option_name     TEXT NOT NULL,
            display_value   TEXT NOT NULL,
            canonical_value TEXT NOT NULL,
            UNIQUE (product_id, option_name, canonical_value)
        );

        CREATE TABLE IF NOT EXISTS product_image (
            image_id   INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id TEXT NOT NULL REFERENCES product(product_id) ON DELETE CASCADE,
            kind       TEXT NOT NULL,
            url        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS external_product_map (
            map_id              INTEGER PRIMARY KEY AUTOINCREMENT,
            system              TEXT NOT NULL,
            external_id         TEXT NOT NULL,
            product_id          TEXT NOT NULL REFERENCES product(product_id) ON DELETE CASCADE,
            external_url        TEXT,
            source_of_truth     TEXT NOT NULL,
            raw_snapshot        TEXT NOT NULL,
            last_sync_direction TEXT,
            last_synced_at      TEXT,
            created_at          TEXT NOT NULL,
            UNIQUE (system, external_id)
        );

        CREATE TABLE IF NOT EXISTS code_sequence (
            issued_category_id TEXT PRIMARY KEY,
            last_seq           INTEGER NOT NULL CHECK (last_seq >= 0)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id         TEXT PRIMARY KEY,
            file             TEXT NOT NULL,
            status           TEXT NOT NULL,
            total_rows       INTEGER NOT NULL,
            processed        INTEGER NOT NULL,
            skipped_existing INTEGER NOT NULL,
            error_rows       INTEGER NOT NULL,
            warning_rows     INTEGER NOT NULL,
            started_at       TEXT NOT NULL,
            finished_at      TEXT NOT NULL,
            report_json      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id   TEXT NOT NULL,
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;
    Ok(())
}

/// 打开连接并引导 schema（CLI 入口使用）
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}
