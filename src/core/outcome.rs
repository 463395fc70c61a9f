// 移行結果モデル
//
// ステージ単位の結果、テーブル単位・外部キー単位の結果、
// 実行全体の集計（MigrationReport）を表現します。

use chrono::{DateTime, Duration, Local};
use serde::Serialize;

/// テーブル単位の処理ステージ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Introspect,
    CreateSchema,
    Export,
    Import,
    Constraints,
    Indexes,
    Sequences,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Introspect => "introspect",
            Stage::CreateSchema => "create_schema",
            Stage::Export => "export",
            Stage::Import => "import",
            Stage::Constraints => "constraints",
            Stage::Indexes => "indexes",
            Stage::Sequences => "sequences",
        };
        write!(f, "{}", name)
    }
}

/// ステージの結果
///
/// Warning はテーブルの成功を妨げず、Fatal はそのテーブルの処理を打ち切ります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Ok,
    Warning(String),
    Fatal(String),
}

impl StageOutcome {
    /// 複数の失敗理由から警告を作成（空なら Ok）
    pub fn from_failures(failures: Vec<String>) -> Self {
        if failures.is_empty() {
            StageOutcome::Ok
        } else {
            StageOutcome::Warning(failures.join("; "))
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StageOutcome::Ok)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StageOutcome::Fatal(_))
    }
}

/// 非致命的ステージの警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageWarning {
    pub stage: Stage,
    pub message: String,
}

/// データの取り込み経路
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPath {
    /// COPY によるバルクロード
    BulkCopy,
    /// バッチ化したINSERTによるフォールバック
    RowByRow,
}

/// テーブルの最終状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    Succeeded,
    Failed { stage: Stage, reason: String },
    Skipped { reason: String },
}

/// テーブル単位の移行結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOutcome {
    pub table: String,
    #[serde(flatten)]
    pub status: TableStatus,
    pub warnings: Vec<StageWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_loaded: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_path: Option<LoadPath>,
}

impl TableOutcome {
    /// 成功したテーブルの結果を作成
    pub fn succeeded(table: &str) -> Self {
        Self {
            table: table.to_string(),
            status: TableStatus::Succeeded,
            warnings: Vec::new(),
            rows_loaded: None,
            load_path: None,
        }
    }

    /// 失敗したテーブルの結果を作成
    pub fn failed(table: &str, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            status: TableStatus::Failed {
                stage,
                reason: reason.into(),
            },
            warnings: Vec::new(),
            rows_loaded: None,
            load_path: None,
        }
    }

    /// スキップしたテーブルの結果を作成
    pub fn skipped(table: &str, reason: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            status: TableStatus::Skipped {
                reason: reason.into(),
            },
            warnings: Vec::new(),
            rows_loaded: None,
            load_path: None,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, TableStatus::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TableStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, TableStatus::Skipped { .. })
    }

    /// 指定ステージの警告があるかどうか
    pub fn has_warning(&self, stage: Stage) -> bool {
        self.warnings.iter().any(|w| w.stage == stage)
    }
}

/// 外部キーの最終状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForeignKeyStatus {
    Created,
    Failed { reason: String },
    Skipped { reason: String },
}

/// 外部キー単位の移行結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyOutcome {
    /// 移行元の制約名
    pub constraint_name: String,
    /// 移行先で生成した制約名
    pub target_name: String,
    pub table_name: String,
    pub ref_table_name: String,
    #[serde(flatten)]
    pub status: ForeignKeyStatus,
}

impl ForeignKeyOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self.status, ForeignKeyStatus::Created)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ForeignKeyStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ForeignKeyStatus::Skipped { .. })
    }
}

/// 移行全体の集計
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub tables: Vec<TableOutcome>,
    pub foreign_keys: Vec<ForeignKeyOutcome>,
}

impl MigrationReport {
    /// 対象テーブル数
    pub fn total_tables(&self) -> usize {
        self.tables.len()
    }

    /// 成功したテーブル名（処理順）
    pub fn succeeded_tables(&self) -> Vec<&str> {
        self.table_names(TableOutcome::is_succeeded)
    }

    /// 失敗したテーブル名（処理順）
    pub fn failed_tables(&self) -> Vec<&str> {
        self.table_names(TableOutcome::is_failed)
    }

    /// スキップしたテーブル名（処理順）
    pub fn skipped_tables(&self) -> Vec<&str> {
        self.table_names(TableOutcome::is_skipped)
    }

    /// 警告の総数
    pub fn warning_count(&self) -> usize {
        self.tables.iter().map(|t| t.warnings.len()).sum()
    }

    /// 経過時間
    pub fn duration(&self) -> Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }

    /// 指定テーブルの結果を取得
    pub fn table(&self, name: &str) -> Option<&TableOutcome> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// 指定した移行元制約名の外部キー結果を取得
    pub fn foreign_key(&self, constraint_name: &str) -> Option<&ForeignKeyOutcome> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.constraint_name == constraint_name)
    }

    fn table_names(&self, predicate: fn(&TableOutcome) -> bool) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| predicate(t))
            .map(|t| t.table.as_str())
            .collect()
    }
}
