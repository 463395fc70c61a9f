// migrateコマンドハンドラー
//
// 移行処理のエントリーポイントを実装します。
// - 設定ファイル・CLIフラグ・環境変数からの設定解決
// - 移行元/移行先への接続
// - オーケストレーターの実行とレポートの書き出し

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::mysql_source::MySqlSource;
use crate::adapters::postgres_target::PostgresTarget;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::config::{DatabaseConfig, MigrationConfig};
use crate::core::naming::CONFIG_FILE;
use crate::core::outcome::{ForeignKeyStatus, MigrationReport, TableStatus};
use crate::services::config_loader::ConfigLoader;
use crate::services::migration_orchestrator::{MigrationOptions, MigrationOrchestrator};
use crate::services::report::MigrationReportService;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// migrateコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct MigrateOutput {
    /// レポートの出力先
    pub report_path: PathBuf,
    /// 移行結果
    pub report: MigrationReport,
    /// テキスト出力メッセージ
    #[serde(skip)]
    pub text_message: String,
}

impl CommandOutput for MigrateOutput {
    fn to_text(&self) -> String {
        self.text_message.clone()
    }
}

/// 接続設定のCLI上書き値
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ConnectionOverrides {
    fn apply(&self, config: &mut DatabaseConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(user) = &self.user {
            config.user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
    }
}

/// migrateコマンドの入力パラメータ
#[derive(Debug, Clone, Default)]
pub struct MigrateCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 移行元の上書き値
    pub source: ConnectionOverrides,
    /// 移行先の上書き値
    pub target: ConnectionOverrides,
    /// 移行対象テーブル
    pub tables: Option<Vec<String>>,
    /// 中間ファイルの出力ディレクトリ
    pub output_dir: Option<PathBuf>,
    /// レポートの出力先
    pub report_path: Option<PathBuf>,
    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// migrateコマンドハンドラー
#[derive(Debug, Default)]
pub struct MigrateCommandHandler {}

impl MigrateCommandHandler {
    /// 新しいMigrateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// migrateコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - migrateコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// レポートが作成できた場合は移行結果のサマリー（個別テーブルの失敗を含む）、
    /// 設定・接続・テーブル一覧取得・レポート書き出しの失敗時はエラー
    pub async fn execute(&self, command: &MigrateCommand) -> Result<String> {
        let config = self.resolve_config(command)?;
        debug!(
            source_host = %config.source.host,
            target_host = %config.target.host,
            output_dir = %config.output_dir.display(),
            "Resolved migration config"
        );

        let connections = DatabaseConnectionService::new();
        let source_conn = connections
            .connect_source(&config.source)
            .await
            .context("Failed to connect to the MySQL source")?;
        let target_conn = match connections.connect_target(&config.target).await {
            Ok(conn) => conn,
            Err(e) => {
                connections.close(source_conn).await;
                return Err(e).context("Failed to connect to the PostgreSQL target");
            }
        };

        let options = MigrationOptions {
            database: config.source.database.clone(),
            output_dir: config.output_dir.clone(),
            tables: config.tables.clone(),
        };
        let mut orchestrator = MigrationOrchestrator::new(
            MySqlSource::new(source_conn, config.source.database.clone()),
            PostgresTarget::new(target_conn),
            options,
        );
        let result = orchestrator.run().await;

        let (source, target) = orchestrator.into_parts();
        connections.close(source.into_connection()).await;
        connections.close(target.into_connection()).await;

        let report = result.context("Failed to list source tables")?;

        let report_path = self.resolve_path(command, &config.report_path);
        MigrationReportService::new()
            .write(&report, &report_path)
            .context("Failed to write migration report")?;
        info!(path = %report_path.display(), "Migration complete");

        let output = MigrateOutput {
            text_message: self.format_summary(&report, &report_path),
            report_path,
            report,
        };
        render_output(&output, &command.format)
    }

    /// 設定ファイル・CLIフラグ・環境変数の順に設定を解決
    ///
    /// 明示された設定ファイルは必須、既定の設定ファイルは存在する場合のみ読み込みます。
    pub fn resolve_config(&self, command: &MigrateCommand) -> Result<MigrationConfig> {
        let default_path = command.project_path.join(CONFIG_FILE);
        let mut config = match &command.config_path {
            Some(path) => ConfigLoader::from_file(path)?,
            None if default_path.exists() => ConfigLoader::from_file(&default_path)?,
            None => MigrationConfig::new(
                DatabaseConfig::new("localhost", ""),
                DatabaseConfig::new("localhost", ""),
            ),
        };

        command.source.apply(&mut config.source);
        command.target.apply(&mut config.target);
        if let Some(tables) = &command.tables {
            config.tables = Some(tables.clone());
        }
        if let Some(output_dir) = &command.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(report_path) = &command.report_path {
            config.report_path = report_path.clone();
        }
        if let Some(timeout) = command.timeout {
            config.source.timeout = Some(timeout);
            config.target.timeout = Some(timeout);
        }

        let config = ConfigLoader::apply_env_overrides(config);
        config.validate()?;
        Ok(config)
    }

    fn resolve_path(&self, command: &MigrateCommand, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            command.project_path.join(path)
        }
    }

    /// 移行結果のサマリーをフォーマット
    pub fn format_summary(&self, report: &MigrationReport, report_path: &Path) -> String {
        let mut output = String::new();

        output.push_str("=== Migration Summary ===\n\n");

        for table in &report.tables {
            let line = match &table.status {
                TableStatus::Succeeded => {
                    let rows = table
                        .rows_loaded
                        .map(|r| format!("{} rows", r))
                        .unwrap_or_else(|| "rows unknown".to_string());
                    if table.warnings.is_empty() {
                        format!("{} {} ({})", "✓".green(), table.table, rows)
                    } else {
                        format!(
                            "{} {} ({}, {} warnings)",
                            "⚠".yellow(),
                            table.table,
                            rows,
                            table.warnings.len()
                        )
                    }
                }
                TableStatus::Failed { stage, reason } => {
                    format!("{} {} [{}]: {}", "✗".red(), table.table, stage, reason)
                }
                TableStatus::Skipped { reason } => {
                    format!("{} {}: {}", "-".dimmed(), table.table, reason)
                }
            };
            output.push_str(&format!("  {}\n", line));
        }

        let created = report
            .foreign_keys
            .iter()
            .filter(|f| matches!(f.status, ForeignKeyStatus::Created))
            .count();

        output.push_str(&format!(
            "\nTables: {} total, {} succeeded, {} failed, {} skipped\n",
            report.total_tables(),
            report.succeeded_tables().len().to_string().green(),
            report.failed_tables().len().to_string().red(),
            report.skipped_tables().len()
        ));
        output.push_str(&format!(
            "Foreign keys: {} of {} created\n",
            created,
            report.foreign_keys.len()
        ));
        output.push_str(&format!("Report written to {}\n", report_path.display()));

        output
    }
}
