// ==========================================
// 商品主码系统 - 重试退避策略
// ==========================================
// 职责: 指数退避重试，显式状态机（尝试计数 + 计算延迟 + 单一挂起点）
// 语义: 总尝试次数 = retries + 1；第 k 次重试前延迟 = initial × 2^(k-1)，
//       首次尝试前无延迟；重试耗尽后返回最后一次失败
// ==========================================

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 重试次数（不含首次尝试）
    pub retries: u32,
    /// 首次重试前的延迟
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, initial_backoff: Duration) -> Self {
        Self {
            retries,
            initial_backoff,
        }
    }

    /// 以当前策略驱动一个可重复的异步操作
    ///
    /// # 参数
    /// - op: 接收尝试序号（1 起算）的操作闭包
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let total_attempts = self.retries + 1;
        let mut attempt = 1u32;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= total_attempts {
                        // 重试耗尽，返回最后一次失败
                        return Err(err);
                    }

                    // 指数因子饱和处理: retries 很大时不溢出（延迟封顶而非 panic）
                    let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
                    let delay = self.initial_backoff.saturating_mul(factor);
                    warn!(
                        attempt,
                        total_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "调用失败，退避后重试"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_exhausts_with_expected_delays() {
        // retries=3, backoff=500ms → 恰好 4 次尝试，延迟 500/1000/2000ms
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let attempts = Arc::new(AtomicU32::new(0));

        let start = Instant::now();
        let result: Result<(), String> = policy
            .run(|_| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err("boom".to_string())
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(Instant::now() - start, Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stops_retrying() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<u32, String> = policy
            .run(|attempt| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    if attempt >= 3 {
                        Ok(attempt)
                    } else {
                        Err("not yet".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_retry_count_does_not_overflow_backoff() {
        // 第 33 次重试起 2^(k-1) 超出 u32，因子与延迟均应封顶而非 panic
        let policy = RetryPolicy::new(40, Duration::from_millis(1));
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<(), String> = policy
            .run(|_| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err("boom".to_string())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 41);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(500));
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<(), String> = policy
            .run(|_| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err("boom".to_string())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
