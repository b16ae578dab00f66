// ==========================================
// 商品主码系统 - 最小间隔限速器
// ==========================================
// 职责: 严格最小间隔调度，任意两次调用起点之间的间隔 >= ceil(1000/R) ms
// 红线: 槽位预约必须在并发调用者之间原子完成（预约时钟是唯一共享状态，
//       不允许丢失预约）；预约后的等待与执行本身并发进行
// ==========================================

use crate::sync::error::{SyncError, SyncResult};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

pub struct MinIntervalLimiter {
    min_interval: Duration,
    /// 最近一次已预约的起点（None = 尚无预约）
    last_reserved: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    /// 创建限速器
    ///
    /// # 参数
    /// - rate_per_sec: 每秒最大事件数；0 为配置错误
    pub fn new(rate_per_sec: u32) -> SyncResult<Self> {
        if rate_per_sec == 0 {
            return Err(SyncError::InvalidRate(rate_per_sec));
        }
        // 间隔向上取整，保证观测间隔不小于名义间隔
        let min_interval = Duration::from_millis(1000u64.div_ceil(rate_per_sec as u64));
        Ok(Self {
            min_interval,
            last_reserved: Mutex::new(None),
        })
    }

    /// 预约下一个允许的起点并挂起到该时刻
    ///
    /// 起点 = max(now, 最近预约) + min_interval。
    /// 预约在锁内完成（原子，不会双重占用同一槽位），等待在锁外进行。
    pub async fn acquire(&self) -> Instant {
        let slot = {
            let mut last = self.last_reserved.lock().await;
            let now = Instant::now();
            let slot = match *last {
                None => now,
                Some(prev) => prev.max(now),
            } + self.min_interval;
            *last = Some(slot);
            slot
        };

        sleep_until(slot).await;
        slot
    }

    /// 名义最小间隔（测试与日志用）
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
