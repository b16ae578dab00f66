// ==========================================
// 商品主码系统 - CLI 主入口
// ==========================================
// 用法:
//   master-code-sync import <db> <file> [--allow-existing] [--report <path>]
//   master-code-sync push <db> <results.jsonl> [--dry-run] [--include-synced]
//       [--limit N] [--concurrency N] [--rate N] [--retries N]
// 退出码: 报告含错误或批次有失败项 → 1
// ==========================================

use chrono::Utc;
use std::error::Error;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use master_code_sync::config::ConfigManager;
use master_code_sync::db::open_and_init;
use master_code_sync::domain::{BatchStatus, ImportReport, RowError, RowErrorCode};
use master_code_sync::importer::{ProductImporterImpl, RowValidatorImpl, UniversalFileParser};
use master_code_sync::repository::{ExternalMapRepositoryImpl, ProductImportRepositoryImpl};
use master_code_sync::sync::{create_sync_client, PushBatchRunner, PushOptions, ResultsLog};
use master_code_sync::{logging, ProductImporter, EXTERNAL_SYSTEM};

fn print_usage() {
    eprintln!("用法:");
    eprintln!("  master-code-sync import <db> <file> [--allow-existing] [--report <path>]");
    eprintln!("  master-code-sync push <db> <results.jsonl> [--dry-run] [--include-synced] [--limit N] [--concurrency N] [--rate N] [--retries N]");
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    info!("==================================================");
    info!("{} v{}", master_code_sync::APP_NAME, master_code_sync::VERSION);
    info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let result = match args[1].as_str() {
        "import" => run_import(&args[2..]).await,
        "push" => run_push(&args[2..]).await,
        other => {
            eprintln!("未知子命令: {}", other);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!(error = %e, "执行失败");
            ExitCode::FAILURE
        }
    }
}

/// 导入子命令。返回 Ok(false) 表示报告中存在错误（退出码 1）
async fn run_import(args: &[String]) -> Result<bool, Box<dyn Error>> {
    let mut positional: Vec<&String> = Vec::new();
    let mut allow_existing = false;
    let mut report_path: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--allow-existing" => allow_existing = true,
            "--report" => {
                i += 1;
                report_path = Some(
                    args.get(i)
                        .ok_or("--report 需要一个路径参数")?
                        .to_string(),
                );
            }
            flag if flag.starts_with("--") => return Err(format!("未知参数: {}", flag).into()),
            _ => positional.push(&args[i]),
        }
        i += 1;
    }

    let [db_path, file_path] = positional.as_slice() else {
        print_usage();
        return Err("import 需要 <db> 与 <file> 两个位置参数".into());
    };

    let conn = Arc::new(Mutex::new(open_and_init(db_path)?));
    let import_repo = ProductImportRepositoryImpl::from_connection(conn);
    let importer = ProductImporterImpl::new(
        import_repo,
        Box::new(UniversalFileParser),
        Box::new(RowValidatorImpl),
        EXTERNAL_SYSTEM.to_string(),
    );

    // 顶层失败（文件不可读、数据库异常）也要落一份 failed 报告
    let report = match importer.import_from_file(file_path.as_str(), allow_existing).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, file = %file_path, "导入批次顶层失败");
            failed_report(file_path, allow_existing, e.to_string())
        }
    };

    if let Some(path) = report_path {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!(report = %path, "报告已写出");
    }

    info!(
        total_rows = report.total_rows,
        processed = report.processed,
        skipped_existing = report.skipped_existing,
        warnings = report.warnings.len(),
        errors = report.errors.len(),
        status = ?report.status,
        "导入完成"
    );

    Ok(!report.has_failures())
}

/// 顶层失败（文件不可读、数据库异常）时的替代报告
///
/// 失败原因以 rowNumber=0 的 BATCH_FAILED 条目写入报告，报告文件自身可读懂失败原因
fn failed_report(file: &str, allow_existing: bool, message: String) -> ImportReport {
    let now = Utc::now();
    ImportReport {
        started_at: now,
        finished_at: now,
        file: file.to_string(),
        allow_existing,
        total_rows: 0,
        processed: 0,
        skipped_existing: 0,
        warnings: vec![],
        errors: vec![RowError {
            row_number: 0,
            message,
            code: RowErrorCode::BatchFailed,
        }],
        status: BatchStatus::Failed,
    }
}

/// 推送子命令。返回 Ok(false) 表示批次中有失败项（退出码 1）
async fn run_push(args: &[String]) -> Result<bool, Box<dyn Error>> {
    let mut positional: Vec<&String> = Vec::new();
    let mut options = PushOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dry-run" => options.dry_run = true,
            "--include-synced" => options.only_unsynced = false,
            "--limit" => {
                i += 1;
                options.limit = parse_numeric_flag(args.get(i), "--limit")?;
            }
            "--concurrency" => {
                i += 1;
                options.concurrency = parse_numeric_flag(args.get(i), "--concurrency")?;
            }
            "--rate" => {
                i += 1;
                options.rate_per_sec = parse_numeric_flag(args.get(i), "--rate")?;
            }
            "--retries" => {
                i += 1;
                options.retries = parse_numeric_flag(args.get(i), "--retries")?;
            }
            flag if flag.starts_with("--") => return Err(format!("未知参数: {}", flag).into()),
            _ => positional.push(&args[i]),
        }
        i += 1;
    }

    let [db_path, results_path] = positional.as_slice() else {
        print_usage();
        return Err("push 需要 <db> 与 <results.jsonl> 两个位置参数".into());
    };

    let conn = Arc::new(Mutex::new(open_and_init(db_path)?));
    let config = ConfigManager::from_connection(conn.clone())?;
    let client = create_sync_client(&config).await?;

    let map_repo = Arc::new(ExternalMapRepositoryImpl::from_connection(conn));
    let results_log = Arc::new(ResultsLog::open(results_path.as_str())?);

    let runner = PushBatchRunner::new(map_repo, client, results_log);
    let summary = runner.run_batch(options).await?;

    info!(
        selected = summary.selected,
        pushed = summary.pushed,
        failed = summary.failed,
        skipped_dry_run = summary.skipped_dry_run,
        "推送完成"
    );

    Ok(summary.failed == 0)
}

fn parse_numeric_flag<T: std::str::FromStr>(
    value: Option<&String>,
    flag: &str,
) -> Result<T, Box<dyn Error>> {
    value
        .ok_or_else(|| format!("{} 需要一个数值参数", flag))?
        .parse::<T>()
        .map_err(|_| format!("{} 的参数必须是数值", flag).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_report_carries_failure_reason() {
        let report = failed_report("missing.csv", false, "无法读取文件: missing.csv".to_string());

        assert!(report.has_failures());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row_number, 0);
        assert_eq!(report.errors[0].code, RowErrorCode::BatchFailed);
        assert!(report.errors[0].message.contains("missing.csv"));

        // 报告文件自身要能说明失败原因
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["errors"][0]["code"], "BATCH_FAILED");
        assert_eq!(json["errors"][0]["rowNumber"], 0);
    }
}
