// 移行オーケストレーター
//
// テーブルごとに以下のステージを逐次実行し、最後に外部キーをまとめて作成します。
//
// INTROSPECT → CREATE_SCHEMA → EXPORT → IMPORT → CONSTRAINTS → INDEXES → SEQUENCES
//
// CREATE_SCHEMA / EXPORT / IMPORT の失敗はそのテーブルを失敗にし、次のテーブルへ進みます。
// CONSTRAINTS / INDEXES / SEQUENCES の失敗は警告として記録します。

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::adapters::sql_generator::PostgresSqlGenerator;
use crate::core::error::DatabaseError;
use crate::core::outcome::{
    ForeignKeyOutcome, ForeignKeyStatus, MigrationReport, Stage, StageOutcome, StageWarning,
    TableOutcome, TableStatus,
};
use crate::core::schema::{ForeignKeySpec, TableSchema};
use crate::services::data_transfer::DataTransferService;
use crate::services::sequence_reconciler::SequenceReconciler;
use crate::services::traits::{RowExporter, SourceCatalog, TargetSession};

/// 移行オプション
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// 移行元のデータベース名（外部キーの読み取り範囲）
    pub database: String,
    /// 中間ファイルの出力ディレクトリ
    pub output_dir: PathBuf,
    /// 移行対象テーブル（`None` なら移行元の全テーブル）
    pub tables: Option<Vec<String>>,
}

/// 移行オーケストレーター
///
/// 移行元と移行先の接続をそれぞれ1つ保持し、全ての処理を逐次実行します。
pub struct MigrationOrchestrator<S, T> {
    source: S,
    target: T,
    options: MigrationOptions,
    transfer: DataTransferService,
    generator: PostgresSqlGenerator,
    reconciler: SequenceReconciler,
}

impl<S, T> MigrationOrchestrator<S, T>
where
    S: SourceCatalog + RowExporter,
    T: TargetSession,
{
    /// 新しいオーケストレーターを作成
    pub fn new(source: S, target: T, options: MigrationOptions) -> Self {
        let transfer = DataTransferService::new(options.output_dir.clone());
        Self {
            source,
            target,
            options,
            transfer,
            generator: PostgresSqlGenerator::new(),
            reconciler: SequenceReconciler::new(),
        }
    }

    /// データ転送サービスを差し替え（バッチサイズの調整用）
    pub fn with_transfer_service(mut self, transfer: DataTransferService) -> Self {
        self.transfer = transfer;
        self
    }

    /// 移行元と移行先を取り出す
    pub fn into_parts(self) -> (S, T) {
        (self.source, self.target)
    }

    /// 移行を実行
    ///
    /// テーブル単位・外部キー単位の失敗は結果に記録され、エラーにはなりません。
    /// 移行対象テーブルの一覧を取得できない場合のみエラーを返します。
    pub async fn run(&mut self) -> Result<MigrationReport, DatabaseError> {
        let started_at = Local::now();

        let tables = self.resolve_tables().await?;
        info!(count = tables.len(), "Starting migration");

        let mut outcomes = Vec::with_capacity(tables.len());
        for table in &tables {
            let outcome = self.migrate_table(table).await;
            match &outcome.status {
                TableStatus::Succeeded => {
                    info!(table = %table, warnings = outcome.warnings.len(), "Table migrated")
                }
                TableStatus::Failed { stage, reason } => {
                    error!(table = %table, stage = %stage, reason = %reason, "Table migration failed")
                }
                TableStatus::Skipped { reason } => {
                    warn!(table = %table, reason = %reason, "Table skipped")
                }
            }
            outcomes.push(outcome);
        }

        let foreign_keys = self.migrate_foreign_keys(&outcomes).await;

        let report = MigrationReport {
            started_at,
            finished_at: Local::now(),
            tables: outcomes,
            foreign_keys,
        };
        info!(
            succeeded = report.succeeded_tables().len(),
            failed = report.failed_tables().len(),
            skipped = report.skipped_tables().len(),
            "Migration finished"
        );
        Ok(report)
    }

    /// 移行対象テーブルを決定
    async fn resolve_tables(&mut self) -> Result<Vec<String>, DatabaseError> {
        match &self.options.tables {
            Some(tables) => Ok(tables.clone()),
            None => self.source.list_tables().await,
        }
    }

    /// 1テーブルを移行
    async fn migrate_table(&mut self, table: &str) -> TableOutcome {
        // INTROSPECT
        info!(table = %table, stage = %Stage::Introspect, "Reading source schema");
        let schema = match self.introspect(table).await {
            Ok(Some(schema)) => schema,
            Ok(None) => return TableOutcome::skipped(table, "table has no columns in the source"),
            Err(e) => return TableOutcome::failed(table, Stage::Introspect, e.to_string()),
        };

        // CREATE_SCHEMA
        info!(table = %table, stage = %Stage::CreateSchema, "Creating target table");
        if let StageOutcome::Fatal(reason) = self.create_table(&schema).await {
            return TableOutcome::failed(table, Stage::CreateSchema, reason);
        }

        // EXPORT
        info!(table = %table, stage = %Stage::Export, "Exporting rows");
        let artifact = match self
            .transfer
            .export_table(&mut self.source, table, &schema.columns)
            .await
        {
            Ok(path) => path,
            Err(e) => return TableOutcome::failed(table, Stage::Export, e.to_string()),
        };

        // IMPORT
        info!(table = %table, stage = %Stage::Import, "Importing rows");
        let summary = match self
            .transfer
            .import_table(&mut self.target, table, &artifact)
            .await
        {
            Ok(summary) => summary,
            Err(e) => return TableOutcome::failed(table, Stage::Import, e.to_string()),
        };

        let mut outcome = TableOutcome::succeeded(table);
        outcome.rows_loaded = summary.rows_loaded;
        outcome.load_path = Some(summary.load_path);
        if let Some(reason) = summary.bulk_error {
            record_stage(
                &mut outcome,
                Stage::Import,
                StageOutcome::Warning(format!("bulk copy failed, loaded row by row: {}", reason)),
            );
        }

        // CONSTRAINTS
        let result = self.create_primary_key(&schema).await;
        record_stage(&mut outcome, Stage::Constraints, result);

        // INDEXES
        let result = self.create_indexes(&schema).await;
        record_stage(&mut outcome, Stage::Indexes, result);

        // SEQUENCES
        let result = self.reconciler.reconcile(&mut self.target, table).await;
        record_stage(&mut outcome, Stage::Sequences, result);

        outcome
    }

    /// カラム・主キー・インデックスを読み取る（カラムがなければ `None`）
    async fn introspect(&mut self, table: &str) -> Result<Option<TableSchema>, DatabaseError> {
        let columns = self.source.get_columns(table).await?;
        if columns.is_empty() {
            return Ok(None);
        }
        let primary_key = self.source.get_primary_key(table).await?;
        let indexes = self.source.get_indexes(table).await?;

        debug!(
            table = %table,
            columns = columns.len(),
            primary_key = ?primary_key.columns,
            indexes = indexes.len(),
            "Source schema loaded"
        );

        Ok(Some(TableSchema {
            name: table.to_string(),
            columns,
            primary_key,
            indexes,
        }))
    }

    async fn create_table(&mut self, schema: &TableSchema) -> StageOutcome {
        let sql = self
            .generator
            .generate_create_table(&schema.name, &schema.columns);
        match self.target.execute(&sql).await {
            Ok(()) => StageOutcome::Ok,
            Err(e) => StageOutcome::Fatal(e.to_string()),
        }
    }

    async fn create_primary_key(&mut self, schema: &TableSchema) -> StageOutcome {
        let Some(sql) = self
            .generator
            .generate_primary_key(&schema.name, &schema.primary_key)
        else {
            return StageOutcome::Ok;
        };

        match self.target.execute(&sql).await {
            Ok(()) => StageOutcome::Ok,
            Err(e) => StageOutcome::Warning(format!(
                "{}: {}",
                self.generator.primary_key_name(&schema.name),
                e
            )),
        }
    }

    /// インデックスを1つずつ作成し、失敗をまとめて警告にする
    async fn create_indexes(&mut self, schema: &TableSchema) -> StageOutcome {
        let mut failures = Vec::new();

        for index in schema.indexes.values() {
            let sql = self.generator.generate_create_index(&schema.name, index);
            if let Err(e) = self.target.execute(&sql).await {
                failures.push(format!(
                    "{}: {}",
                    self.generator.index_name(&schema.name, index),
                    e
                ));
            }
        }

        StageOutcome::from_failures(failures)
    }

    /// 全テーブルの処理後に外部キーを作成
    ///
    /// この実行で処理しなかったテーブルが所有する外部キーは対象外です。
    /// 所有テーブルか参照先テーブルがこの実行で失敗・スキップした外部キーは作成せずスキップします。
    async fn migrate_foreign_keys(&mut self, outcomes: &[TableOutcome]) -> Vec<ForeignKeyOutcome> {
        let processed: HashSet<&str> = outcomes.iter().map(|o| o.table.as_str()).collect();
        let unavailable: HashSet<&str> = outcomes
            .iter()
            .filter(|o| !o.is_succeeded())
            .map(|o| o.table.as_str())
            .collect();

        let database = self.options.database.clone();
        let foreign_keys = match self.source.get_foreign_keys(&database).await {
            Ok(foreign_keys) => foreign_keys,
            Err(e) => {
                error!(error = %e, "Failed to read foreign keys from the source catalog");
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        for foreign_key in foreign_keys.values() {
            if !processed.contains(foreign_key.table_name.as_str()) {
                continue;
            }

            let status = if unavailable.contains(foreign_key.table_name.as_str()) {
                ForeignKeyStatus::Skipped {
                    reason: format!("table '{}' was not migrated", foreign_key.table_name),
                }
            } else if unavailable.contains(foreign_key.ref_table_name.as_str()) {
                ForeignKeyStatus::Skipped {
                    reason: format!(
                        "referenced table '{}' was not migrated",
                        foreign_key.ref_table_name
                    ),
                }
            } else {
                self.create_foreign_key(foreign_key).await
            };

            results.push(ForeignKeyOutcome {
                constraint_name: foreign_key.constraint_name.clone(),
                target_name: self.generator.foreign_key_name(foreign_key),
                table_name: foreign_key.table_name.clone(),
                ref_table_name: foreign_key.ref_table_name.clone(),
                status,
            });
        }

        results
    }

    async fn create_foreign_key(&mut self, foreign_key: &ForeignKeySpec) -> ForeignKeyStatus {
        let sql = self.generator.generate_foreign_key(foreign_key);
        match self.target.execute(&sql).await {
            Ok(()) => {
                info!(
                    constraint = %foreign_key.constraint_name,
                    table = %foreign_key.table_name,
                    "Foreign key created"
                );
                ForeignKeyStatus::Created
            }
            Err(e) => {
                warn!(
                    constraint = %foreign_key.constraint_name,
                    table = %foreign_key.table_name,
                    error = %e,
                    "Failed to create foreign key"
                );
                ForeignKeyStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// 非致命的ステージの結果をテーブル結果に反映
fn record_stage(outcome: &mut TableOutcome, stage: Stage, result: StageOutcome) {
    match result {
        StageOutcome::Ok => {}
        StageOutcome::Warning(message) | StageOutcome::Fatal(message) => {
            warn!(table = %outcome.table, stage = %stage, message = %message, "Stage completed with warnings");
            outcome.warnings.push(StageWarning { stage, message });
        }
    }
}
