// ==========================================
// 商品主码系统 - 发码引擎
// ==========================================
// 职责: 类目内原子序号分配 + 主码格式化
// 红线: 只在调用方的事务内执行，绝不单独提交；
//       计数器值不得缓存在进程内存中跨事务复用
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Transaction};

/// 每类目序号上限（5 位零填充格式的硬上限）
///
/// 超出即拒绝发码（SequenceExhausted）：回绕会造成主码冲突，
/// 加宽会破坏对外的主码格式契约，两者都不做。
pub const MAX_SEQUENCE: i64 = 99_999;

/// 一次发码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub master_code: String,
    pub sequence: i64,
}

/// 格式化主码: {类目}-{5位零填充序号}
pub fn format_master_code(category_id: &str, sequence: i64) -> String {
    format!("{}-{:05}", category_id, sequence)
}

/// 在调用方事务内为类目分配下一个序号并格式化主码
///
/// 行为:
/// - 类目计数器不存在 → 以序号 1 创建
/// - 已存在 → 单条语句原子自增并读取（read-modify-write 不可拆分）
///
/// 并发正确性依赖数据库事务的隔离（两个事务同时对同一类目发码
/// 不会丢失更新），而不是进程内锁。
pub fn issue(tx: &Transaction, category_id: &str) -> RepositoryResult<IssuedCode> {
    let sequence: i64 = tx.query_row(
        r#"
        INSERT INTO code_sequence (issued_category_id, last_seq)
        VALUES (?1, 1)
        ON CONFLICT(issued_category_id) DO UPDATE SET last_seq = last_seq + 1
        RETURNING last_seq
        "#,
        params![category_id],
        |row| row.get(0),
    )?;

    if sequence > MAX_SEQUENCE {
        return Err(RepositoryError::SequenceExhausted {
            category_id: category_id.to_string(),
            sequence,
        });
    }

    Ok(IssuedCode {
        master_code: format_master_code(category_id, sequence),
        sequence,
    })
}
