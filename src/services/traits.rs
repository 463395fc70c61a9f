// サービストレイト定義
//
// テスト時のモック差し替えを可能にするためのトレイト群。
// 移行元カタログ、行エクスポート、移行先セッションの境界を抽象化します。

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::adapters::artifact::ArtifactWriter;
use crate::core::error::{DatabaseError, TransferError};
use crate::core::schema::{ColumnDescriptor, ForeignKeyMap, IndexMap, PrimaryKeySpec};

/// 移行元カタログ（スキーマ情報の読み取り）
#[async_trait]
pub trait SourceCatalog: Send {
    /// 現在のデータベースの実テーブル名（名前順）
    async fn list_tables(&mut self) -> Result<Vec<String>, DatabaseError>;

    /// テーブルのカラム記述子（序数順、テーブルがなければ空）
    async fn get_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, DatabaseError>;

    /// テーブルの主キー（なければ空）
    async fn get_primary_key(&mut self, table: &str) -> Result<PrimaryKeySpec, DatabaseError>;

    /// データベース全体の外部キー（制約名でグループ化）
    async fn get_foreign_keys(&mut self, database: &str) -> Result<ForeignKeyMap, DatabaseError>;

    /// テーブルのインデックス（主キーを除き、インデックス名でグループ化）
    async fn get_indexes(&mut self, table: &str) -> Result<IndexMap, DatabaseError>;
}

/// 移行元の行エクスポート
#[async_trait]
pub trait RowExporter: Send {
    /// テーブルの全行をバッチ単位で中間ファイルに書き出す
    ///
    /// # Returns
    ///
    /// 書き出した行数
    async fn export_rows(
        &mut self,
        table: &str,
        columns: &[ColumnDescriptor],
        batch_size: usize,
        writer: &mut ArtifactWriter,
    ) -> Result<u64, TransferError>;
}

/// 自動採番カラムと、それを所有するシーケンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceColumn {
    pub column_name: String,
    pub sequence_name: String,
}

/// 移行先セッション（DDL/DMLの実行）
#[async_trait]
pub trait TargetSession: Send {
    /// 文を自動コミットで実行
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// 中間ファイルを COPY で一括取り込み（単一トランザクション）
    ///
    /// 失敗時はロールバックされ、テーブルは取り込み前の状態に戻ります。
    async fn bulk_copy(
        &mut self,
        table: &str,
        columns: &[String],
        artifact: &Path,
    ) -> Result<u64, TransferError>;

    /// カラム名 → 宣言型名
    async fn column_types(&mut self, table: &str) -> Result<HashMap<String, String>, DatabaseError>;

    /// 1バッチ分の行を1つの複数行INSERTで挿入し、コミット
    async fn insert_batch(
        &mut self,
        table: &str,
        columns: &[String],
        column_types: &HashMap<String, String>,
        rows: &[Vec<Option<String>>],
    ) -> Result<u64, DatabaseError>;

    /// テーブルの行数
    async fn row_count(&mut self, table: &str) -> Result<i64, DatabaseError>;

    /// シーケンスを既定値に持つカラムの一覧
    async fn sequence_columns(&mut self, table: &str) -> Result<Vec<SequenceColumn>, DatabaseError>;

    /// シーケンスをカラムの最大値に同期
    async fn sync_sequence(
        &mut self,
        table: &str,
        sequence: &SequenceColumn,
    ) -> Result<(), DatabaseError>;
}
