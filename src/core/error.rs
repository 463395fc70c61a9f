// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、DatabaseError, IoError, TransferError を定義します。

use thiserror::Error;

/// データベースエラー
///
/// 移行元・移行先いずれかのデータベース操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction {
        /// エラーメッセージ
        message: String,
    },
}

impl DatabaseError {
    /// SQL付きのクエリエラーを作成
    pub fn query(message: impl Into<String>, sql: impl Into<String>) -> Self {
        DatabaseError::Query {
            message: message.into(),
            sql: Some(sql.into()),
        }
    }

    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }

    /// トランザクションエラーかどうか
    pub fn is_transaction(&self) -> bool {
        matches!(self, DatabaseError::Transaction { .. })
    }

    /// 失敗したSQLを取得
    pub fn sql(&self) -> Option<&str> {
        match self {
            DatabaseError::Query { sql, .. } => sql.as_deref(),
            _ => None,
        }
    }
}

/// I/Oエラー
///
/// 中間ファイルやレポートの操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum IoError {
    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File write error
    #[error("Failed to write file: {path} (cause: {cause})")]
    FileWrite {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory creation error
    #[error("Failed to create directory: {path} (cause: {cause})")]
    DirectoryCreate {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }

    /// ファイル書き込みエラーかどうか
    pub fn is_file_write(&self) -> bool {
        matches!(self, IoError::FileWrite { .. })
    }

    /// ディレクトリ作成エラーかどうか
    pub fn is_directory_create(&self) -> bool {
        matches!(self, IoError::DirectoryCreate { .. })
    }
}

/// データ転送エラー
///
/// エクスポートとインポートの各経路で発生するエラーを表現します。
/// BulkLoad は行単位インポートへのフォールバックを引き起こし、
/// Export と Fallback はテーブルの移行失敗になります。
#[derive(Debug, Error)]
pub enum TransferError {
    /// Export error
    #[error("Export of table '{table}' failed: {cause}")]
    Export {
        /// テーブル名
        table: String,
        /// エラー原因
        cause: String,
    },

    /// Bulk load error
    #[error("Bulk load into table '{table}' failed: {cause}")]
    BulkLoad {
        /// テーブル名
        table: String,
        /// エラー原因
        cause: String,
    },

    /// Row-by-row fallback error
    #[error("Row-by-row import into table '{table}' failed: {cause}")]
    Fallback {
        /// テーブル名
        table: String,
        /// エラー原因
        cause: String,
    },

    /// Artifact error
    #[error("Interchange artifact error: {0}")]
    Artifact(#[from] IoError),
}

impl TransferError {
    /// エクスポートエラーを作成
    pub fn export(table: &str, cause: impl ToString) -> Self {
        TransferError::Export {
            table: table.to_string(),
            cause: cause.to_string(),
        }
    }

    /// バルクロードエラーを作成
    pub fn bulk_load(table: &str, cause: impl ToString) -> Self {
        TransferError::BulkLoad {
            table: table.to_string(),
            cause: cause.to_string(),
        }
    }

    /// フォールバックエラーを作成
    pub fn fallback(table: &str, cause: impl ToString) -> Self {
        TransferError::Fallback {
            table: table.to_string(),
            cause: cause.to_string(),
        }
    }

    /// バルクロードエラーかどうか
    pub fn is_bulk_load(&self) -> bool {
        matches!(self, TransferError::BulkLoad { .. })
    }

    /// フォールバックエラーかどうか
    pub fn is_fallback(&self) -> bool {
        matches!(self, TransferError::Fallback { .. })
    }
}
