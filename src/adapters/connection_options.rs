// 接続オプションビルダー
//
// DatabaseConfig から sqlx の接続オプションを組み立てる。
// URL文字列を経由しないため、パスワード中の記号をエンコードする必要がない。

use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;

use crate::core::config::{DatabaseConfig, DEFAULT_MYSQL_PORT, DEFAULT_POSTGRES_PORT};
use crate::core::naming::APP_NAME;

/// 移行元（MySQL）の接続オプションを生成
///
/// ユーザー未指定時は `root` を使用します。文字セットは utf8mb4 に固定します。
pub fn mysql_connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port_or(DEFAULT_MYSQL_PORT))
        .database(&config.database)
        .username(config.user.as_deref().unwrap_or("root"))
        .charset("utf8mb4");

    match config.password.as_deref() {
        Some(password) if !password.is_empty() => options.password(password),
        _ => options,
    }
}

/// 移行先（PostgreSQL）の接続オプションを生成
///
/// ユーザー未指定時は `postgres` を使用します。
pub fn postgres_connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port_or(DEFAULT_POSTGRES_PORT))
        .database(&config.database)
        .username(config.user.as_deref().unwrap_or("postgres"))
        .application_name(APP_NAME);

    match config.password.as_deref() {
        Some(password) if !password.is_empty() => options.password(password),
        _ => options,
    }
}
