// 中間ファイル（CSV）
//
// エクスポートした行を `<output_dir>/<table>.csv` に書き出し、
// インポート時にバッチ単位で読み戻します。
//
// 形式: UTF-8、カンマ区切り、必要な場合のみクォート、ヘッダー行あり。
// NULL は `\N`、バイナリ値は `\x` 接頭辞付きの小文字16進で表現します。

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Reader, ReaderBuilder, StringRecord, Writer, WriterBuilder};

use crate::core::error::IoError;
use crate::core::naming::ARTIFACT_EXTENSION;

/// NULL を表すセンチネル
pub const NULL_MARKER: &str = "\\N";

/// バイナリ値の16進表現の接頭辞（PostgreSQLの bytea hex 形式）
pub const BINARY_PREFIX: &str = "\\x";

/// エクスポートされた1セルの値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Null,
    Binary(Vec<u8>),
    Text(String),
}

/// セル値を中間ファイル上の文字列に変換
pub fn encode_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => NULL_MARKER.to_string(),
        CellValue::Binary(bytes) => format!("{}{}", BINARY_PREFIX, hex::encode(bytes)),
        CellValue::Text(text) => text.clone(),
    }
}

/// 中間ファイル上の文字列を取り込み用の値に変換（センチネルは `None`）
pub fn decode_cell(field: &str) -> Option<String> {
    if field == NULL_MARKER {
        None
    } else {
        Some(field.to_string())
    }
}

/// テーブルの中間ファイルパス
pub fn artifact_path(output_dir: &Path, table: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", table, ARTIFACT_EXTENSION))
}

fn write_error(path: &Path, cause: impl ToString) -> IoError {
    IoError::FileWrite {
        path: path.display().to_string(),
        cause: cause.to_string(),
    }
}

fn read_error(path: &Path, cause: impl ToString) -> IoError {
    IoError::FileRead {
        path: path.display().to_string(),
        cause: cause.to_string(),
    }
}

/// 中間ファイルの書き込み
///
/// 作成時にヘッダー行を書き込み、以降はバッチ単位で行を追記します。
pub struct ArtifactWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows_written: u64,
}

impl ArtifactWriter {
    /// 出力ディレクトリを作成し、中間ファイルを新規作成
    ///
    /// 既存のファイルは上書きされます。
    pub fn create(output_dir: &Path, table: &str, header: &[String]) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::DirectoryCreate {
            path: output_dir.display().to_string(),
            cause: e.to_string(),
        })?;

        let path = artifact_path(output_dir, table);
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_path(&path)
            .map_err(|e| write_error(&path, e))?;

        writer
            .write_record(header)
            .map_err(|e| write_error(&path, e))?;

        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    /// 1バッチ分の行を追記
    pub fn write_batch(&mut self, rows: &[Vec<CellValue>]) -> Result<(), IoError> {
        for row in rows {
            let record: Vec<String> = row.iter().map(encode_cell).collect();
            self.writer
                .write_record(&record)
                .map_err(|e| write_error(&self.path, e))?;
        }
        self.writer
            .flush()
            .map_err(|e| write_error(&self.path, e))?;
        self.rows_written += rows.len() as u64;
        Ok(())
    }

    /// 書き込みを完了し、書き込んだ行数を返す
    pub fn finish(mut self) -> Result<u64, IoError> {
        self.writer
            .flush()
            .map_err(|e| write_error(&self.path, e))?;
        Ok(self.rows_written)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

/// 中間ファイルの読み込み
pub struct ArtifactReader {
    path: PathBuf,
    reader: Reader<File>,
    header: Vec<String>,
    record: StringRecord,
}

impl ArtifactReader {
    /// 中間ファイルを開き、ヘッダー行を読み込む
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| read_error(path, e))?;

        let header = reader
            .headers()
            .map_err(|e| read_error(path, e))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header,
            record: StringRecord::new(),
        })
    }

    /// ヘッダー（カラム名）
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// 最大 `batch_size` 行を読み込む（終端では空のベクタ）
    pub fn next_batch(&mut self, batch_size: usize) -> Result<Vec<Vec<Option<String>>>, IoError> {
        let mut batch = Vec::with_capacity(batch_size);

        while batch.len() < batch_size {
            let has_record = self
                .reader
                .read_record(&mut self.record)
                .map_err(|e| read_error(&self.path, e))?;
            if !has_record {
                break;
            }
            batch.push(self.record.iter().map(decode_cell).collect());
        }

        Ok(batch)
    }
}
