// ==========================================
// 商品主码系统 - 推送结果日志
// ==========================================
// 职责: 推送结果按行追加到 JSONL 文件
// 约束: 整行在锁内一次写出，并发任务间不会出现半行交织
// ==========================================

use crate::domain::PushOutcome;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

pub struct ResultsLog {
    file: Mutex<File>,
}

impl ResultsLog {
    /// 打开（或创建）追加模式的结果日志文件
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// 追加一条完整的结果记录（单行 JSON + 换行）
    pub fn append(&self, outcome: &PushOutcome) -> std::io::Result<()> {
        let mut line = serde_json::to_string(outcome)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("锁获取失败: {}", e)))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
