// PostgreSQL移行先アダプター
//
// DDLの実行、COPY による一括取り込み、複数行INSERT によるフォールバック、
// シーケンスの参照と同期を1つの接続上で行います。

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Row};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::adapters::sql_generator::PostgresSqlGenerator;
use crate::core::error::{DatabaseError, IoError, TransferError};
use crate::services::traits::{SequenceColumn, TargetSession};

/// COPY で送信する1チャンクのサイズ
const COPY_CHUNK_SIZE: usize = 64 * 1024;

const COLUMN_TYPES_SQL: &str = r#"
    SELECT a.attname::text, format_type(a.atttypid, NULL)
    FROM pg_attribute a
    JOIN pg_class c ON c.oid = a.attrelid
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = current_schema()
      AND c.relname = $1
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY a.attnum
"#;

const SEQUENCE_COLUMNS_SQL: &str = r#"
    SELECT
        column_name::text,
        pg_get_serial_sequence(quote_ident(table_name::text), column_name::text)
    FROM information_schema.columns
    WHERE table_schema = current_schema()
      AND table_name::text = $1
      AND column_default LIKE 'nextval(%'
    ORDER BY ordinal_position
"#;

/// PostgreSQL移行先
pub struct PostgresTarget {
    conn: PgConnection,
    generator: PostgresSqlGenerator,
}

impl PostgresTarget {
    /// 接続から作成
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn,
            generator: PostgresSqlGenerator::new(),
        }
    }

    /// 接続を取り出す
    pub fn into_connection(self) -> PgConnection {
        self.conn
    }
}

fn query_error(e: sqlx::Error, sql: &str) -> DatabaseError {
    DatabaseError::query(e.to_string(), sql.trim())
}

/// 中間ファイルの内容を COPY FROM STDIN に流し込む
async fn stream_copy(
    conn: &mut PgConnection,
    statement: &str,
    file: &mut tokio::fs::File,
    table: &str,
    artifact: &Path,
) -> Result<u64, TransferError> {
    let mut copy = conn
        .copy_in_raw(statement)
        .await
        .map_err(|e| TransferError::bulk_load(table, e))?;

    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    loop {
        let read = match file.read(&mut buf).await {
            Ok(read) => read,
            Err(e) => {
                let cause = IoError::FileRead {
                    path: artifact.display().to_string(),
                    cause: e.to_string(),
                };
                if let Err(abort_err) = copy.abort(cause.to_string()).await {
                    debug!(error = %abort_err, "COPY abort reported an error");
                }
                return Err(cause.into());
            }
        };
        if read == 0 {
            break;
        }

        if let Err(e) = copy.send(&buf[..read]).await {
            if let Err(abort_err) = copy.abort(e.to_string()).await {
                debug!(error = %abort_err, "COPY abort reported an error");
            }
            return Err(TransferError::bulk_load(table, e));
        }
    }

    copy.finish()
        .await
        .map_err(|e| TransferError::bulk_load(table, e))
}

#[async_trait]
impl TargetSession for PostgresTarget {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        debug!(sql = %sql, "Executing statement");
        sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| query_error(e, sql))
    }

    async fn bulk_copy(
        &mut self,
        table: &str,
        columns: &[String],
        artifact: &Path,
    ) -> Result<u64, TransferError> {
        let statement = self.generator.generate_copy_from_stdin(table, columns);
        debug!(table = %table, sql = %statement, "Starting bulk copy");

        let mut file = tokio::fs::File::open(artifact)
            .await
            .map_err(|e| IoError::FileRead {
                path: artifact.display().to_string(),
                cause: e.to_string(),
            })?;

        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| TransferError::bulk_load(table, e))?;

        match stream_copy(&mut tx, &statement, &mut file, table, artifact).await {
            Ok(rows) => {
                tx.commit()
                    .await
                    .map_err(|e| TransferError::bulk_load(table, e))?;
                Ok(rows)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(table = %table, error = %rollback_err, "Rollback after failed COPY failed");
                }
                Err(e)
            }
        }
    }

    async fn column_types(&mut self, table: &str) -> Result<HashMap<String, String>, DatabaseError> {
        let rows = sqlx::query(COLUMN_TYPES_SQL)
            .bind(table)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| query_error(e, COLUMN_TYPES_SQL))?;

        rows.iter()
            .map(|row| Ok((row.try_get::<String, _>(0)?, row.try_get::<String, _>(1)?)))
            .collect::<Result<HashMap<_, _>, sqlx::Error>>()
            .map_err(|e| query_error(e, COLUMN_TYPES_SQL))
    }

    async fn insert_batch(
        &mut self,
        table: &str,
        columns: &[String],
        column_types: &HashMap<String, String>,
        rows: &[Vec<Option<String>>],
    ) -> Result<u64, DatabaseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = self
            .generator
            .generate_insert_batch(table, columns, column_types, rows.len());

        let mut query = sqlx::query(&sql);
        for row in rows {
            for value in row {
                query = query.bind(value.as_deref());
            }
        }

        let mut tx = self.conn.begin().await.map_err(|e| DatabaseError::Transaction {
            message: format!("Failed to begin insert batch for '{}': {}", table, e),
        })?;

        // 失敗時は tx のドロップでロールバックされる
        let result = query
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::query(e.to_string(), format!("INSERT INTO {} ...", table)))?;

        tx.commit().await.map_err(|e| DatabaseError::Transaction {
            message: format!("Failed to commit insert batch for '{}': {}", table, e),
        })?;

        Ok(result.rows_affected())
    }

    async fn row_count(&mut self, table: &str) -> Result<i64, DatabaseError> {
        let sql = self.generator.generate_row_count(table);
        sqlx::query(&sql)
            .fetch_one(&mut self.conn)
            .await
            .and_then(|row| row.try_get::<i64, _>(0))
            .map_err(|e| query_error(e, &sql))
    }

    async fn sequence_columns(&mut self, table: &str) -> Result<Vec<SequenceColumn>, DatabaseError> {
        let rows = sqlx::query(SEQUENCE_COLUMNS_SQL)
            .bind(table)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| query_error(e, SEQUENCE_COLUMNS_SQL))?;

        let pairs = rows
            .iter()
            .map(|row| Ok((row.try_get::<String, _>(0)?, row.try_get::<Option<String>, _>(1)?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| query_error(e, SEQUENCE_COLUMNS_SQL))?;

        // 所有関係のないシーケンスを既定値に持つカラムは対象外
        Ok(pairs
            .into_iter()
            .filter_map(|(column_name, sequence)| {
                sequence.map(|sequence_name| SequenceColumn {
                    column_name,
                    sequence_name,
                })
            })
            .collect())
    }

    async fn sync_sequence(
        &mut self,
        table: &str,
        sequence: &SequenceColumn,
    ) -> Result<(), DatabaseError> {
        let sql = self
            .generator
            .generate_sync_sequence(table, &sequence.column_name);
        debug!(table = %table, sequence = %sequence.sequence_name, sql = %sql, "Syncing sequence");

        sqlx::query(&sql)
            .bind(&sequence.sequence_name)
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| query_error(e, &sql))
    }
}
