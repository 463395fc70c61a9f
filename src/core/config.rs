// 設定管理
//
// 移行元・移行先の接続設定と移行オプションを表現します。
// YAML形式の設定ファイルからの読み込みと妥当性検証を提供します。
// ファイルI/Oと環境変数による上書きは services::config_loader で扱います。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::naming::{DEFAULT_OUTPUT_DIR, DEFAULT_REPORT_FILE};

/// MySQLの既定ポート
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// PostgreSQLの既定ポート
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// 移行設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// 移行元（MySQL）の接続設定
    pub source: DatabaseConfig,

    /// 移行先（PostgreSQL）の接続設定
    pub target: DatabaseConfig,

    /// 中間ファイルの出力ディレクトリ
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 移行対象テーブル（未指定なら全テーブル）
    #[serde(default)]
    pub tables: Option<Vec<String>>,

    /// 移行レポートの出力先
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_report_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_FILE)
}

impl MigrationConfig {
    /// 接続設定から既定値の移行設定を作成
    pub fn new(source: DatabaseConfig, target: DatabaseConfig) -> Self {
        Self {
            source,
            target,
            output_dir: default_output_dir(),
            tables: None,
            report_path: default_report_path(),
        }
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        self.source
            .validate()
            .context("Invalid source database config")?;
        self.target
            .validate()
            .context("Invalid target database config")?;

        if let Some(tables) = &self.tables {
            if tables.iter().any(|t| t.trim().is_empty()) {
                return Err(anyhow!("Table names in the subset must not be empty"));
            }
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("Output directory is not specified"));
        }

        Ok(())
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for MigrationConfig {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// データベース接続設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号（未指定ならエンジンの既定ポート）
    #[serde(default)]
    pub port: Option<u16>,

    /// データベース名
    #[serde(default)]
    pub database: String,

    /// ユーザー名
    #[serde(default)]
    pub user: Option<String>,

    /// パスワード
    #[serde(default)]
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl DatabaseConfig {
    /// ホストとデータベース名から接続設定を作成
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        if self.host.is_empty() {
            return Err(anyhow!("Database host is not specified"));
        }

        Ok(())
    }

    /// ポート番号を解決（未指定なら既定ポート）
    pub fn port_or(&self, default_port: u16) -> u16 {
        self.port.unwrap_or(default_port)
    }
}
