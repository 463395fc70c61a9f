// MySQL移行元アダプター
//
// INFORMATION_SCHEMA からスキーマ情報を読み取り、テーブルの行を中間ファイルへ書き出します。
// カタログクエリは全てパラメータをバインドし、識別子を埋め込みません。
// 文字列カラムは CHAR、数値は SIGNED にキャストし、照合順序や符号の違いに依存せずデコードします。

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::Row;
use tracing::debug;

use crate::adapters::artifact::{ArtifactWriter, CellValue};
use crate::adapters::sql_quote::{quote_columns_mysql, quote_identifier_mysql};
use crate::adapters::type_mapping::map_type;
use crate::core::error::{DatabaseError, TransferError};
use crate::core::schema::{
    group_foreign_keys, group_indexes, ColumnDescriptor, ForeignKeyMap, ForeignKeyRow, IndexMap,
    IndexRow, PrimaryKeySpec,
};
use crate::services::traits::{RowExporter, SourceCatalog};

const LIST_TABLES_SQL: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR(255)) AS table_name
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

// tinyint(1) は表示幅 1 を最大長として扱う（BOOLEAN への変換に使用）
const COLUMNS_SQL: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR(255)) AS column_name,
        CAST(DATA_TYPE AS CHAR(255)) AS data_type,
        CAST(CASE
            WHEN DATA_TYPE = 'tinyint' AND COLUMN_TYPE LIKE 'tinyint(1)%' THEN 1
            ELSE CHARACTER_MAXIMUM_LENGTH
        END AS SIGNED) AS max_length,
        CAST(IF(IS_NULLABLE = 'YES', 1, 0) AS SIGNED) AS is_nullable,
        CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
        CAST(IF(EXTRA LIKE '%auto_increment%', 1, 0) AS SIGNED) AS is_auto_increment,
        CAST(IF(EXTRA LIKE '%DEFAULT_GENERATED%', 1, 0) AS SIGNED) AS is_default_generated
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

const PRIMARY_KEY_SQL: &str = r#"
    SELECT CAST(COLUMN_NAME AS CHAR(255)) AS column_name
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY'
    ORDER BY ORDINAL_POSITION
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR(255)) AS table_name,
        CAST(COLUMN_NAME AS CHAR(255)) AS column_name,
        CAST(CONSTRAINT_NAME AS CHAR(255)) AS constraint_name,
        CAST(REFERENCED_TABLE_NAME AS CHAR(255)) AS referenced_table_name,
        CAST(REFERENCED_COLUMN_NAME AS CHAR(255)) AS referenced_column_name
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = ?
      AND REFERENCED_TABLE_SCHEMA = ?
      AND REFERENCED_TABLE_NAME IS NOT NULL
    ORDER BY TABLE_NAME, CONSTRAINT_NAME, ORDINAL_POSITION
"#;

const INDEXES_SQL: &str = r#"
    SELECT
        CAST(INDEX_NAME AS CHAR(255)) AS index_name,
        CAST(COLUMN_NAME AS CHAR(255)) AS column_name,
        CAST(NON_UNIQUE AS SIGNED) AS non_unique
    FROM INFORMATION_SCHEMA.STATISTICS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME <> 'PRIMARY'
    ORDER BY INDEX_NAME, SEQ_IN_INDEX
"#;

/// MySQL移行元
///
/// 移行全体を通して1つの接続を保持します。
pub struct MySqlSource {
    conn: MySqlConnection,
    database: String,
}

impl MySqlSource {
    /// 接続と対象データベース名から作成
    pub fn new(conn: MySqlConnection, database: impl Into<String>) -> Self {
        Self {
            conn,
            database: database.into(),
        }
    }

    /// 対象データベース名
    pub fn database(&self) -> &str {
        &self.database
    }

    /// 接続を取り出す
    pub fn into_connection(self) -> MySqlConnection {
        self.conn
    }

    async fn fetch_catalog(
        &mut self,
        sql: &'static str,
        params: &[&str],
    ) -> Result<Vec<MySqlRow>, DatabaseError> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }

        query
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| DatabaseError::query(e.to_string(), sql.trim()))
    }
}

fn decode_error(sql: &str, e: sqlx::Error) -> DatabaseError {
    DatabaseError::query(format!("Failed to decode catalog row: {}", e), sql.trim())
}

/// 全カラムの SELECT 文を生成（並び順は指定しない）
pub fn select_all_sql(table: &str, columns: &[ColumnDescriptor]) -> String {
    let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    format!(
        "SELECT {} FROM {}",
        quote_columns_mysql(&names),
        quote_identifier_mysql(table)
    )
}

/// 1セルの生の値を中間ファイル用の値に変換
///
/// テキストプロトコルで取得するため、非NULL値は常に文字列表現のバイト列です。
pub fn to_cell_value(raw: Option<Vec<u8>>, is_binary: bool) -> CellValue {
    match raw {
        None => CellValue::Null,
        Some(bytes) if is_binary => CellValue::Binary(bytes),
        Some(bytes) => CellValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

#[async_trait]
impl SourceCatalog for MySqlSource {
    async fn list_tables(&mut self) -> Result<Vec<String>, DatabaseError> {
        let database = self.database.clone();
        let rows = self.fetch_catalog(LIST_TABLES_SQL, &[database.as_str()]).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error(LIST_TABLES_SQL, e))
    }

    async fn get_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        let database = self.database.clone();
        let rows = self.fetch_catalog(COLUMNS_SQL, &[database.as_str(), table]).await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnDescriptor {
                    name: row.try_get(0)?,
                    source_type: row.try_get(1)?,
                    max_length: row.try_get(2)?,
                    nullable: row.try_get::<i64, _>(3)? == 1,
                    default_expr: row.try_get(4)?,
                    default_is_expression: row.try_get::<i64, _>(6)? == 1,
                    auto_increment: row.try_get::<i64, _>(5)? == 1,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| decode_error(COLUMNS_SQL, e))
    }

    async fn get_primary_key(&mut self, table: &str) -> Result<PrimaryKeySpec, DatabaseError> {
        let database = self.database.clone();
        let rows = self.fetch_catalog(PRIMARY_KEY_SQL, &[database.as_str(), table]).await?;

        let columns = rows
            .iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error(PRIMARY_KEY_SQL, e))?;

        Ok(PrimaryKeySpec::new(columns))
    }

    async fn get_foreign_keys(&mut self, database: &str) -> Result<ForeignKeyMap, DatabaseError> {
        let rows = self
            .fetch_catalog(FOREIGN_KEYS_SQL, &[database, database])
            .await?;

        let fk_rows = rows
            .iter()
            .map(|row| {
                Ok(ForeignKeyRow::new(
                    row.try_get::<String, _>(0)?,
                    row.try_get::<String, _>(1)?,
                    row.try_get::<String, _>(2)?,
                    row.try_get::<String, _>(3)?,
                    row.try_get::<String, _>(4)?,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| decode_error(FOREIGN_KEYS_SQL, e))?;

        Ok(group_foreign_keys(fk_rows))
    }

    async fn get_indexes(&mut self, table: &str) -> Result<IndexMap, DatabaseError> {
        let database = self.database.clone();
        let rows = self.fetch_catalog(INDEXES_SQL, &[database.as_str(), table]).await?;

        // 式インデックスは COLUMN_NAME が NULL になるため除外する
        let index_rows = rows
            .iter()
            .map(|row| {
                let column: Option<String> = row.try_get(1)?;
                match column {
                    Some(column) => Ok(Some(IndexRow::new(
                        row.try_get::<String, _>(0)?,
                        column,
                        row.try_get::<i64, _>(2)?,
                    ))),
                    None => Ok(None),
                }
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| decode_error(INDEXES_SQL, e))?;

        Ok(group_indexes(index_rows.into_iter().flatten()))
    }
}

#[async_trait]
impl RowExporter for MySqlSource {
    async fn export_rows(
        &mut self,
        table: &str,
        columns: &[ColumnDescriptor],
        batch_size: usize,
        writer: &mut ArtifactWriter,
    ) -> Result<u64, TransferError> {
        let sql = select_all_sql(table, columns);
        let binary_columns: Vec<bool> = columns
            .iter()
            .map(|c| map_type(&c.source_type, c.max_length).is_binary())
            .collect();
        debug!(table = %table, sql = %sql, "Exporting rows");

        // raw_sql はテキストプロトコルで実行されるため、値は文字列表現で届く
        let mut rows = sqlx::raw_sql(&sql).fetch(&mut self.conn);
        let mut batch: Vec<Vec<CellValue>> = Vec::with_capacity(batch_size);
        let mut exported = 0u64;

        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| TransferError::export(table, e))?
        {
            let mut cells = Vec::with_capacity(binary_columns.len());
            for (index, is_binary) in binary_columns.iter().enumerate() {
                let raw: Option<Vec<u8>> = row
                    .try_get_unchecked(index)
                    .map_err(|e| TransferError::export(table, e))?;
                cells.push(to_cell_value(raw, *is_binary));
            }
            batch.push(cells);

            if batch.len() >= batch_size {
                writer.write_batch(&batch)?;
                exported += batch.len() as u64;
                debug!(table = %table, exported, "Wrote export batch");
                batch.clear();
            }
        }

        if !batch.is_empty() {
            writer.write_batch(&batch)?;
            exported += batch.len() as u64;
        }

        Ok(exported)
    }
}
