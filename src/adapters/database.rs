// データベース接続アダプター
//
// 移行元（MySQL）と移行先（PostgreSQL）への単一接続を確立します。
// 移行は逐次実行のため、接続プールは使用しません。

use std::future::Future;
use std::time::Duration;

use sqlx::mysql::MySqlConnection;
use sqlx::postgres::PgConnection;
use sqlx::{ConnectOptions, Connection};
use tracing::info;

use crate::adapters::connection_options::{mysql_connect_options, postgres_connect_options};
use crate::core::config::DatabaseConfig;
use crate::core::error::DatabaseError;

/// 既定の接続タイムアウト（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// データベース接続サービス
///
/// 接続の確立と疎通確認を行います。
#[derive(Debug, Clone)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 移行元（MySQL）に接続
    ///
    /// # Arguments
    ///
    /// * `config` - 移行元の接続設定
    ///
    /// # Returns
    ///
    /// 疎通確認済みの接続またはエラー
    pub async fn connect_source(
        &self,
        config: &DatabaseConfig,
    ) -> Result<MySqlConnection, DatabaseError> {
        let options = mysql_connect_options(config);
        let mut conn = with_timeout(config, "MySQL", options.connect()).await?;

        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "MySQL connection test failed".to_string(),
                cause: e.to_string(),
            })?;

        info!(host = %config.host, database = %config.database, "Connected to MySQL source");
        Ok(conn)
    }

    /// 移行先（PostgreSQL）に接続
    ///
    /// # Arguments
    ///
    /// * `config` - 移行先の接続設定
    ///
    /// # Returns
    ///
    /// 疎通確認済みの接続またはエラー
    pub async fn connect_target(
        &self,
        config: &DatabaseConfig,
    ) -> Result<PgConnection, DatabaseError> {
        let options = postgres_connect_options(config);
        let mut conn = with_timeout(config, "PostgreSQL", options.connect()).await?;

        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: "PostgreSQL connection test failed".to_string(),
                cause: e.to_string(),
            })?;

        info!(host = %config.host, database = %config.database, "Connected to PostgreSQL target");
        Ok(conn)
    }

    /// 接続を閉じる
    pub async fn close<C: Connection>(&self, conn: C) {
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "Failed to close connection cleanly");
        }
    }
}

impl Default for DatabaseConnectionService {
    fn default() -> Self {
        Self::new()
    }
}

/// 接続処理にタイムアウトを適用
async fn with_timeout<C>(
    config: &DatabaseConfig,
    engine: &str,
    connect: impl Future<Output = Result<C, sqlx::Error>>,
) -> Result<C, DatabaseError> {
    let timeout = Duration::from_secs(config.timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS));

    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(DatabaseError::Connection {
            message: format!(
                "Failed to connect to {} at {}:{}",
                engine,
                config.host,
                config.port.map(|p| p.to_string()).unwrap_or_else(|| "default port".to_string())
            ),
            cause: e.to_string(),
        }),
        Err(_) => Err(DatabaseError::Connection {
            message: format!("Timed out connecting to {} at {}", engine, config.host),
            cause: format!("no response within {} seconds", timeout.as_secs()),
        }),
    }
}
