/// 設定ファイル管理機能のテスト
///
/// 設定ファイルの読み込み、既定値、環境変数によるパスワード補完、
/// 妥当性検証が正しく動作することを確認します。

#[cfg(test)]
mod config_tests {
    use mysql2pg::core::config::{MigrationConfig, DEFAULT_MYSQL_PORT, DEFAULT_POSTGRES_PORT};
    use mysql2pg::services::config_loader::ConfigLoader;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
source:
  host: mysql.internal
  port: 13306
  database: shop
  user: reader
  password: secret
target:
  host: pg.internal
  database: shop
  user: loader
output_dir: /var/tmp/mysql2pg
tables:
  - customers
  - orders
report_path: reports/shop.txt
"#;

    /// 全項目を指定した設定ファイルの読み込みテスト
    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".mysql2pg.yaml");
        fs::write(&path, FULL_CONFIG).unwrap();

        let config = ConfigLoader::from_file(&path).unwrap();

        assert_eq!(config.source.host, "mysql.internal");
        assert_eq!(config.source.port_or(DEFAULT_MYSQL_PORT), 13306);
        assert_eq!(config.source.user.as_deref(), Some("reader"));
        assert_eq!(config.target.port_or(DEFAULT_POSTGRES_PORT), 5432);
        assert_eq!(config.output_dir, Path::new("/var/tmp/mysql2pg"));
        assert_eq!(
            config.tables,
            Some(vec!["customers".to_string(), "orders".to_string()])
        );
        assert_eq!(config.report_path, Path::new("reports/shop.txt"));
        assert!(config.validate().is_ok());
    }

    /// 省略した項目に既定値が入ることを確認
    #[test]
    fn test_defaults_for_omitted_fields() {
        let yaml = r#"
source:
  database: shop
target:
  database: shop
"#;
        let config: MigrationConfig = yaml.parse().unwrap();

        assert_eq!(config.source.host, "localhost");
        assert_eq!(config.output_dir, Path::new("./exported_data"));
        assert_eq!(config.report_path, Path::new("migration_report.txt"));
        assert!(config.tables.is_none());
        assert!(config.source.password.is_none());
    }

    /// 環境変数は未指定のパスワードのみを補完することを確認
    #[test]
    fn test_password_fallback_from_environment() {
        let yaml = r#"
source:
  database: shop
  password: from_file
target:
  database: shop
"#;
        let config: MigrationConfig = yaml.parse().unwrap();

        let config = ConfigLoader::apply_overrides_with(config, |key| match key {
            "MYSQL_PWD" => Some("from_env_mysql".to_string()),
            "PGPASSWORD" => Some("from_env_pg".to_string()),
            _ => None,
        });

        assert_eq!(config.source.password.as_deref(), Some("from_file"));
        assert_eq!(config.target.password.as_deref(), Some("from_env_pg"));
    }

    /// 不正な設定の検証エラーテスト
    #[test]
    fn test_validation_errors() {
        let missing_database = r#"
source:
  host: localhost
target:
  database: shop
"#;
        let config: MigrationConfig = missing_database.parse().unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("source"));

        let empty_table = r#"
source:
  database: shop
target:
  database: shop
tables: ["customers", ""]
"#;
        let config: MigrationConfig = empty_table.parse().unwrap();
        assert!(config.validate().is_err());
    }

    /// 存在しないファイルと不正なYAMLはエラーになることを確認
    #[test]
    fn test_load_errors() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ConfigLoader::from_file(&temp_dir.path().join("missing.yaml")).is_err());

        let path = temp_dir.path().join("broken.yaml");
        fs::write(&path, "source: [unclosed").unwrap();
        assert!(ConfigLoader::from_file(&path).is_err());
    }
}
