// ==========================================
// 商品主码系统 - 推送批次执行器
// ==========================================
// 职责: 候选项选择 → 并发推送（信号量 + 限速 + 重试）→ 结果落盘
// 红线: 单项失败不中止批次；只有真实成功才翻转同步状态；
//       dry-run 不调用客户端、不改库，但照常落一条结果记录
// ==========================================

use crate::domain::{PushCandidate, PushOutcome, PushStatus, PushSummary, EXTERNAL_SYSTEM};
use crate::repository::ExternalMapRepository;
use crate::sync::client::ExternalSyncClient;
use crate::sync::rate_limiter::MinIntervalLimiter;
use crate::sync::results_log::ResultsLog;
use crate::sync::retry::RetryPolicy;
use chrono::Utc;
use futures::future;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

/// 推送批次参数
#[derive(Debug, Clone)]
pub struct PushOptions {
    pub dry_run: bool,
    /// true: 只选从未推送过的条目; false: 已推送条目也重新入选（重刷场景）
    pub only_unsynced: bool,
    /// 单批最大候选数
    pub limit: usize,
    /// 并发在途调用上限
    pub concurrency: usize,
    /// 每秒调用上限
    pub rate_per_sec: u32,
    /// 失败后的重试次数（不含首次尝试）
    pub retries: u32,
    pub initial_backoff: Duration,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            only_unsynced: true,
            limit: 100,
            concurrency: 4,
            rate_per_sec: 5,
            retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

// ==========================================
// PushBatchRunner
// ==========================================
pub struct PushBatchRunner<R: ExternalMapRepository + 'static> {
    map_repo: Arc<R>,
    client: Arc<dyn ExternalSyncClient>,
    results_log: Arc<ResultsLog>,
}

impl<R: ExternalMapRepository + 'static> PushBatchRunner<R> {
    pub fn new(
        map_repo: Arc<R>,
        client: Arc<dyn ExternalSyncClient>,
        results_log: Arc<ResultsLog>,
    ) -> Self {
        Self {
            map_repo,
            client,
            results_log,
        }
    }

    /// 执行一个推送批次，所有已调度项结清后返回汇总
    #[instrument(skip(self, options), fields(dry_run = options.dry_run, limit = options.limit))]
    pub async fn run_batch(&self, options: PushOptions) -> Result<PushSummary, Box<dyn Error>> {
        let limiter = Arc::new(MinIntervalLimiter::new(options.rate_per_sec)?);
        let semaphore = Arc::new(Semaphore::new(options.concurrency));
        let retry_policy = RetryPolicy::new(options.retries, options.initial_backoff);

        let candidates = self
            .map_repo
            .select_push_candidates(EXTERNAL_SYSTEM, options.only_unsynced, options.limit)
            .await?;

        let selected = candidates.len();
        info!(selected, "推送候选项已选出");

        let mut handles = Vec::with_capacity(selected);
        for candidate in candidates {
            let map_repo = self.map_repo.clone();
            let client = self.client.clone();
            let results_log = self.results_log.clone();
            let limiter = limiter.clone();
            let semaphore = semaphore.clone();
            let dry_run = options.dry_run;

            handles.push(tokio::spawn(async move {
                // 信号量守卫在整个条目处理期间持有；本批信号量不会被关闭
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return ItemResult::Failed,
                };

                push_one(
                    &*map_repo,
                    &*client,
                    &results_log,
                    &limiter,
                    retry_policy,
                    candidate,
                    dry_run,
                )
                .await
            }));
        }

        let mut summary = PushSummary {
            selected,
            ..PushSummary::default()
        };
        for joined in future::join_all(handles).await {
            match joined {
                Ok(ItemResult::Pushed) => summary.pushed += 1,
                Ok(ItemResult::Failed) => summary.failed += 1,
                Ok(ItemResult::SkippedDryRun) => summary.skipped_dry_run += 1,
                Err(join_err) => {
                    // 任务 panic 视为该项失败，批次继续结算
                    error!(error = %join_err, "推送任务异常终止");
                    summary.failed += 1;
                }
            }
        }

        info!(
            selected = summary.selected,
            pushed = summary.pushed,
            failed = summary.failed,
            skipped_dry_run = summary.skipped_dry_run,
            "推送批次结清"
        );
        Ok(summary)
    }
}

enum ItemResult {
    Pushed,
    Failed,
    SkippedDryRun,
}

async fn push_one<R: ExternalMapRepository>(
    map_repo: &R,
    client: &dyn ExternalSyncClient,
    results_log: &ResultsLog,
    limiter: &MinIntervalLimiter,
    retry_policy: RetryPolicy,
    candidate: PushCandidate,
    dry_run: bool,
) -> ItemResult {
    if dry_run {
        info!(
            external_id = %candidate.external_id,
            master_code = %candidate.master_code,
            "dry-run: 跳过外部调用与状态翻转"
        );
        record(
            results_log,
            &candidate,
            PushStatus::Success,
            Some("dry-run".to_string()),
        );
        return ItemResult::SkippedDryRun;
    }

    let external_id = candidate.external_id.as_str();
    let master_code = candidate.master_code.as_str();
    let call_result = retry_policy
        .run(|_attempt| async move {
            // 每次尝试单独占用一个限速槽位
            limiter.acquire().await;
            client.update_code(external_id, master_code).await
        })
        .await;

    match call_result {
        Ok(()) => {
            // 先翻转同步状态，再落结果行；翻转失败按失败结算（该项保持可重选）
            if let Err(e) = map_repo
                .mark_pushed(EXTERNAL_SYSTEM, &candidate.external_id, Utc::now())
                .await
            {
                error!(
                    external_id = %candidate.external_id,
                    error = %e,
                    "推送成功但状态翻转失败"
                );
                record(
                    results_log,
                    &candidate,
                    PushStatus::Error,
                    Some(format!("状态翻转失败: {}", e)),
                );
                return ItemResult::Failed;
            }

            record(results_log, &candidate, PushStatus::Success, None);
            ItemResult::Pushed
        }
        Err(e) => {
            warn!(
                external_id = %candidate.external_id,
                error = %e,
                "推送失败，同步状态保持不变"
            );
            record(
                results_log,
                &candidate,
                PushStatus::Error,
                Some(e.to_string()),
            );
            ItemResult::Failed
        }
    }
}

fn record(results_log: &ResultsLog, candidate: &PushCandidate, status: PushStatus, message: Option<String>) {
    let outcome = PushOutcome {
        timestamp: Utc::now(),
        external_id: candidate.external_id.clone(),
        product_id: candidate.product_id.clone(),
        master_code: candidate.master_code.clone(),
        status,
        message,
    };

    if let Err(e) = results_log.append(&outcome) {
        // 日志落盘失败不影响批次结算，仅告警
        error!(external_id = %candidate.external_id, error = %e, "结果日志写入失败");
    }
}
