// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oと環境変数による上書きはこのサービスに集約する。

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::config::MigrationConfig;

/// 移行元パスワードの環境変数（mysql クライアントと同じ名前）
pub const SOURCE_PASSWORD_ENV: &str = "MYSQL_PWD";

/// 移行先パスワードの環境変数（libpq と同じ名前）
pub const TARGET_PASSWORD_ENV: &str = "PGPASSWORD";

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込む
    pub fn from_file(path: &Path) -> Result<MigrationConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        content.parse()
    }

    /// パスワード未指定の接続設定に環境変数の値を適用
    pub fn apply_env_overrides(config: MigrationConfig) -> MigrationConfig {
        Self::apply_overrides_with(config, |key| std::env::var(key).ok())
    }

    /// 任意の参照関数でパスワードを補完
    pub fn apply_overrides_with<F>(mut config: MigrationConfig, lookup: F) -> MigrationConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        if config.source.password.is_none() {
            config.source.password = lookup(SOURCE_PASSWORD_ENV);
        }
        if config.target.password.is_none() {
            config.target.password = lookup(TARGET_PASSWORD_ENV);
        }
        config
    }
}
