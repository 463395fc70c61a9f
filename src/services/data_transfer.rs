// データ転送サービス
//
// 移行元テーブルの行を中間ファイルへエクスポートし、
// 移行先へ COPY で一括取り込みします。COPY が失敗した場合は
// 中間ファイルを読み直してバッチ化した INSERT で取り込みます。

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::adapters::artifact::{ArtifactReader, ArtifactWriter};
use crate::core::error::TransferError;
use crate::core::outcome::LoadPath;
use crate::core::schema::ColumnDescriptor;
use crate::services::traits::{RowExporter, TargetSession};

/// エクスポート時のバッチサイズ
pub const EXPORT_BATCH_SIZE: usize = 1000;

/// フォールバック取り込み時のバッチサイズ
pub const IMPORT_BATCH_SIZE: usize = 100;

/// 1文あたりのバインドパラメータ上限（PostgreSQLのプロトコル制限）
const MAX_BIND_PARAMETERS: usize = 65535;

/// 取り込み結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// 使用した取り込み経路
    pub load_path: LoadPath,
    /// 取り込み後の移行先の行数（取得できなかった場合は `None`）
    pub rows_loaded: Option<i64>,
    /// COPY が失敗した理由（フォールバックした場合のみ）
    pub bulk_error: Option<String>,
}

/// データ転送サービス
#[derive(Debug, Clone)]
pub struct DataTransferService {
    output_dir: PathBuf,
    export_batch_size: usize,
    import_batch_size: usize,
}

impl DataTransferService {
    /// 中間ファイルの出力ディレクトリを指定して作成
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            export_batch_size: EXPORT_BATCH_SIZE,
            import_batch_size: IMPORT_BATCH_SIZE,
        }
    }

    /// バッチサイズを変更（0 は 1 として扱う）
    pub fn with_batch_sizes(mut self, export_batch_size: usize, import_batch_size: usize) -> Self {
        self.export_batch_size = export_batch_size.max(1);
        self.import_batch_size = import_batch_size.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// テーブルを中間ファイルにエクスポート
    ///
    /// # Arguments
    ///
    /// * `source` - 移行元
    /// * `table` - テーブル名
    /// * `columns` - 序数順のカラム記述子（ヘッダーと SELECT のカラム順になる）
    ///
    /// # Returns
    ///
    /// 書き出した中間ファイルのパス
    pub async fn export_table<S>(
        &self,
        source: &mut S,
        table: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<PathBuf, TransferError>
    where
        S: RowExporter + ?Sized,
    {
        let header: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let mut writer = ArtifactWriter::create(&self.output_dir, table, &header)?;

        let exported = source
            .export_rows(table, columns, self.export_batch_size, &mut writer)
            .await?;
        let path = writer.path().to_path_buf();
        writer.finish()?;

        info!(table = %table, rows = exported, path = %path.display(), "Exported table data");
        Ok(path)
    }

    /// 中間ファイルを移行先に取り込む
    ///
    /// COPY を試み、失敗した場合は行単位（バッチINSERT）で取り込みます。
    /// フォールバックも失敗した場合のみエラーになります。
    pub async fn import_table<T>(
        &self,
        target: &mut T,
        table: &str,
        artifact: &Path,
    ) -> Result<ImportSummary, TransferError>
    where
        T: TargetSession + ?Sized,
    {
        let columns = ArtifactReader::open(artifact)?.header().to_vec();

        let (load_path, bulk_error) = match target.bulk_copy(table, &columns, artifact).await {
            Ok(rows) => {
                info!(table = %table, rows, "Bulk copy completed");
                (LoadPath::BulkCopy, None)
            }
            Err(e) => {
                warn!(table = %table, error = %e, "Bulk copy failed, falling back to row-by-row import");
                let inserted = self.import_row_by_row(target, table, artifact).await?;
                info!(table = %table, rows = inserted, "Row-by-row import completed");
                (LoadPath::RowByRow, Some(e.to_string()))
            }
        };

        // 行数は報告のみで、件数の一致は検証しない
        let rows_loaded = match target.row_count(table).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(table = %table, error = %e, "Failed to count loaded rows");
                None
            }
        };

        Ok(ImportSummary {
            load_path,
            rows_loaded,
            bulk_error,
        })
    }

    /// 中間ファイルを読み直し、バッチ単位の INSERT で取り込む
    async fn import_row_by_row<T>(
        &self,
        target: &mut T,
        table: &str,
        artifact: &Path,
    ) -> Result<u64, TransferError>
    where
        T: TargetSession + ?Sized,
    {
        let column_types = target
            .column_types(table)
            .await
            .map_err(|e| TransferError::fallback(table, e))?;

        let mut reader = ArtifactReader::open(artifact)?;
        let columns = reader.header().to_vec();
        let batch_size = self.effective_import_batch_size(columns.len());

        let mut inserted = 0u64;
        loop {
            let batch = reader.next_batch(batch_size)?;
            if batch.is_empty() {
                break;
            }

            inserted += target
                .insert_batch(table, &columns, &column_types, &batch)
                .await
                .map_err(|e| TransferError::fallback(table, e))?;
            debug!(table = %table, inserted, "Committed insert batch");
        }

        Ok(inserted)
    }

    /// カラム数に応じて、バインドパラメータ上限を超えないバッチサイズを決める
    pub fn effective_import_batch_size(&self, column_count: usize) -> usize {
        let limit = (MAX_BIND_PARAMETERS / column_count.max(1)).max(1);
        self.import_batch_size.min(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_import_batch_size() {
        let service = DataTransferService::new("./out");

        assert_eq!(service.effective_import_batch_size(5), IMPORT_BATCH_SIZE);
        assert_eq!(service.effective_import_batch_size(1000), 65);
        assert_eq!(service.effective_import_batch_size(0), IMPORT_BATCH_SIZE);
    }

    #[test]
    fn test_with_batch_sizes_never_zero() {
        let service = DataTransferService::new("./out").with_batch_sizes(0, 0);
        assert_eq!(service.effective_import_batch_size(3), 1);
    }
}
