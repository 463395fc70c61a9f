// 移行レポートサービス
//
// MigrationReport をプレーンテキストに整形し、ファイルに書き出します。

use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::error::IoError;
use crate::core::outcome::{ForeignKeyStatus, LoadPath, MigrationReport, TableStatus};

const RULE: &str = "==================================================";

/// 移行レポートサービス
#[derive(Debug, Clone, Default)]
pub struct MigrationReportService {}

impl MigrationReportService {
    pub fn new() -> Self {
        Self {}
    }

    /// レポートをプレーンテキストに整形
    pub fn render(&self, report: &MigrationReport) -> String {
        let mut lines = vec![
            RULE.to_string(),
            "MySQL to PostgreSQL migration report".to_string(),
            RULE.to_string(),
            format!("Started:  {}", report.started_at.format("%Y-%m-%d %H:%M:%S")),
            format!("Finished: {}", report.finished_at.format("%Y-%m-%d %H:%M:%S")),
            format!("Duration: {}", format_duration(report)),
            String::new(),
            format!(
                "Tables: {} total, {} succeeded, {} failed, {} skipped",
                report.total_tables(),
                report.succeeded_tables().len(),
                report.failed_tables().len(),
                report.skipped_tables().len()
            ),
        ];

        let succeeded: Vec<String> = report
            .tables
            .iter()
            .filter(|t| t.is_succeeded())
            .map(|t| {
                let rows = t
                    .rows_loaded
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let path = t
                    .load_path
                    .map(|p| match p {
                        LoadPath::BulkCopy => "bulk copy",
                        LoadPath::RowByRow => "row by row",
                    })
                    .unwrap_or("-");
                format!("    - {} ({} rows, {})", t.table, rows, path)
            })
            .collect();
        push_section(&mut lines, "Succeeded tables:", succeeded);

        let failed: Vec<String> = report
            .tables
            .iter()
            .filter_map(|t| match &t.status {
                TableStatus::Failed { stage, reason } => {
                    Some(format!("    - {} [{}]: {}", t.table, stage, reason))
                }
                _ => None,
            })
            .collect();
        push_section(&mut lines, "Failed tables:", failed);

        let skipped: Vec<String> = report
            .tables
            .iter()
            .filter_map(|t| match &t.status {
                TableStatus::Skipped { reason } => Some(format!("    - {}: {}", t.table, reason)),
                _ => None,
            })
            .collect();
        push_section(&mut lines, "Skipped tables:", skipped);

        let warnings: Vec<String> = report
            .tables
            .iter()
            .flat_map(|t| {
                t.warnings
                    .iter()
                    .map(move |w| format!("    - {} [{}]: {}", t.table, w.stage, w.message))
            })
            .collect();
        push_section(&mut lines, "Warnings:", warnings);

        if !report.foreign_keys.is_empty() {
            let created = report.foreign_keys.iter().filter(|f| f.is_created()).count();
            let failed = report.foreign_keys.iter().filter(|f| f.is_failed()).count();
            let skipped = report.foreign_keys.iter().filter(|f| f.is_skipped()).count();
            lines.push(String::new());
            lines.push(format!(
                "Foreign keys: {} created, {} failed, {} skipped",
                created, failed, skipped
            ));
            for fk in report.foreign_keys.iter().filter(|f| !f.is_created()) {
                let (label, reason) = match &fk.status {
                    ForeignKeyStatus::Failed { reason } => ("failed", reason.as_str()),
                    ForeignKeyStatus::Skipped { reason } => ("skipped", reason.as_str()),
                    ForeignKeyStatus::Created => continue,
                };
                lines.push(format!(
                    "    - {} ({} -> {}) {}: {}",
                    fk.constraint_name, fk.table_name, fk.ref_table_name, label, reason
                ));
            }
        }

        lines.push(RULE.to_string());
        lines.join("\n") + "\n"
    }

    /// レポートをファイルに書き出す（既存ファイルは上書き）
    pub fn write(&self, report: &MigrationReport, path: &Path) -> Result<(), IoError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IoError::DirectoryCreate {
                path: parent.display().to_string(),
                cause: e.to_string(),
            })?;
        }

        fs::write(path, self.render(report)).map_err(|e| IoError::FileWrite {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

        info!(path = %path.display(), "Migration report written");
        Ok(())
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, entries: Vec<String>) {
    if entries.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(title.to_string());
    lines.extend(entries);
}

fn format_duration(report: &MigrationReport) -> String {
    let millis = report.duration().num_milliseconds().max(0);
    format!("{}.{:03}s", millis / 1000, millis % 1000)
}
