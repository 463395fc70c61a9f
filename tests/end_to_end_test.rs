/// MySQL → PostgreSQL 移行のE2Eテスト
///
/// testcontainersで起動した実際のMySQLとPostgreSQLの間で移行を実行し、
/// 型変換・NULL・バイナリ値・外部キー・シーケンスの結果を確認します。
///
/// 注意: Docker必須のテストは #[ignore] アトリビュートでマークされています。
/// Docker起動時に実行するには: `cargo test -- --ignored`

#[cfg(test)]
mod end_to_end_tests {
    use mysql2pg::adapters::database::DatabaseConnectionService;
    use mysql2pg::adapters::mysql_source::MySqlSource;
    use async_trait::async_trait;
    use mysql2pg::adapters::postgres_target::PostgresTarget;
    use mysql2pg::core::config::DatabaseConfig;
    use mysql2pg::core::error::{DatabaseError, TransferError};
    use mysql2pg::core::outcome::{LoadPath, Stage};
    use mysql2pg::services::migration_orchestrator::{MigrationOptions, MigrationOrchestrator};
    use mysql2pg::services::traits::{SequenceColumn, TargetSession};
    use sqlx::mysql::MySqlConnection;
    use std::collections::HashMap;
    use std::path::Path;
    use sqlx::postgres::PgConnection;
    use sqlx::Row;
    use tempfile::TempDir;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::mysql::Mysql as MysqlImage;
    use testcontainers_modules::postgres::Postgres as PostgresImage;

    const MYSQL_SEED: &[&str] = &[
        "CREATE DATABASE shop",
        "USE shop",
        r#"CREATE TABLE customers (
            id INT AUTO_INCREMENT PRIMARY KEY,
            email VARCHAR(255) NOT NULL,
            active TINYINT(1) NOT NULL DEFAULT 0,
            status VARCHAR(16) NOT NULL DEFAULT 'active',
            nickname VARCHAR(32) NULL,
            avatar BLOB NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE KEY email_unique (email)
        )"#,
        r#"CREATE TABLE orders (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            customer_id INT NOT NULL,
            total DECIMAL(10, 2) NOT NULL,
            KEY customer_idx (customer_id),
            CONSTRAINT orders_customer_fk FOREIGN KEY (customer_id) REFERENCES customers (id)
        )"#,
        r#"INSERT INTO customers (email, active, nickname, avatar) VALUES
            ('a@example.com', 1, NULL, X'FF00'),
            ('b@example.com', 0, '', NULL),
            ('c@example.com', 1, 'comma, "quote"', X'')"#,
        "INSERT INTO orders (customer_id, total) VALUES (1, 10.50), (1, 3.00), (3, 99.99)",
    ];

    /// COPY を常に拒否する移行先（行単位の取り込みを実DBで検証するため）
    struct CopyRejectingTarget(PostgresTarget);

    #[async_trait]
    impl TargetSession for CopyRejectingTarget {
        async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
            self.0.execute(sql).await
        }

        async fn bulk_copy(
            &mut self,
            table: &str,
            _columns: &[String],
            _artifact: &Path,
        ) -> Result<u64, TransferError> {
            Err(TransferError::bulk_load(table, "COPY disabled"))
        }

        async fn column_types(
            &mut self,
            table: &str,
        ) -> Result<HashMap<String, String>, DatabaseError> {
            self.0.column_types(table).await
        }

        async fn insert_batch(
            &mut self,
            table: &str,
            columns: &[String],
            column_types: &HashMap<String, String>,
            rows: &[Vec<Option<String>>],
        ) -> Result<u64, DatabaseError> {
            self.0.insert_batch(table, columns, column_types, rows).await
        }

        async fn row_count(&mut self, table: &str) -> Result<i64, DatabaseError> {
            self.0.row_count(table).await
        }

        async fn sequence_columns(
            &mut self,
            table: &str,
        ) -> Result<Vec<SequenceColumn>, DatabaseError> {
            self.0.sequence_columns(table).await
        }

        async fn sync_sequence(
            &mut self,
            table: &str,
            sequence: &SequenceColumn,
        ) -> Result<(), DatabaseError> {
            self.0.sync_sequence(table, sequence).await
        }
    }

    /// MySQLコンテナを起動し、シードデータを投入
    async fn setup_mysql_container(
    ) -> Result<(ContainerAsync<MysqlImage>, DatabaseConfig), Box<dyn std::error::Error>> {
        let container = MysqlImage::default().with_tag("8.0").start().await?;

        let mut config = DatabaseConfig::new(container.get_host().await?.to_string(), "mysql");
        config.port = Some(container.get_host_port_ipv4(3306).await?);
        config.user = Some("root".to_string());

        // MySQL起動待ち
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        let service = DatabaseConnectionService::new();
        let mut conn: MySqlConnection = service.connect_source(&config).await?;
        for statement in MYSQL_SEED {
            sqlx::raw_sql(statement).execute(&mut conn).await?;
        }
        service.close(conn).await;

        config.database = "shop".to_string();
        Ok((container, config))
    }

    /// PostgreSQLコンテナを起動
    async fn setup_postgres_container(
    ) -> Result<(ContainerAsync<PostgresImage>, DatabaseConfig), Box<dyn std::error::Error>> {
        let container = PostgresImage::default()
            .with_tag("16-alpine")
            .start()
            .await?;

        let mut config = DatabaseConfig::new(container.get_host().await?.to_string(), "postgres");
        config.port = Some(container.get_host_port_ipv4(5432).await?);
        config.user = Some("postgres".to_string());
        config.password = Some("postgres".to_string());

        Ok((container, config))
    }

    /// スキーマとデータが移行され、外部キーとシーケンスが整うことを確認
    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_migrate_shop_database() {
        let (_mysql, source_config) = setup_mysql_container().await.unwrap();
        let (_postgres, target_config) = setup_postgres_container().await.unwrap();
        let output_dir = TempDir::new().unwrap();

        let service = DatabaseConnectionService::new();
        let source = MySqlSource::new(
            service.connect_source(&source_config).await.unwrap(),
            "shop",
        );
        let target = PostgresTarget::new(service.connect_target(&target_config).await.unwrap());

        let mut orchestrator = MigrationOrchestrator::new(
            source,
            target,
            MigrationOptions {
                database: "shop".to_string(),
                output_dir: output_dir.path().to_path_buf(),
                tables: None,
            },
        );
        let report = orchestrator.run().await.unwrap();
        let (_, target) = orchestrator.into_parts();
        let mut pg: PgConnection = target.into_connection();

        assert_eq!(report.succeeded_tables(), vec!["customers", "orders"]);
        assert_eq!(report.warning_count(), 0, "{:?}", report.tables);
        assert_eq!(report.table("orders").unwrap().rows_loaded, Some(3));
        assert_eq!(
            report.table("customers").unwrap().load_path,
            Some(LoadPath::BulkCopy)
        );
        assert!(report.foreign_key("orders_customer_fk").unwrap().is_created());

        // NULL・空文字列・バイナリ値
        let rows = sqlx::query(
            "SELECT active, nickname, avatar FROM customers ORDER BY id",
        )
        .fetch_all(&mut pg)
        .await
        .unwrap();
        let active: bool = rows[0].get(0);
        let nickname: Option<String> = rows[0].get(1);
        let avatar: Option<Vec<u8>> = rows[0].get(2);
        assert!(active);
        assert_eq!(nickname, None);
        assert_eq!(avatar, Some(vec![0xFF, 0x00]));
        assert_eq!(rows[1].get::<Option<String>, _>(1), Some(String::new()));
        assert_eq!(
            rows[2].get::<Option<String>, _>(1).as_deref(),
            Some("comma, \"quote\"")
        );

        // MySQLのリテラルのデフォルト値が型に合わせて移行される
        let defaults = sqlx::query(
            "INSERT INTO customers (email) VALUES ('d@example.com') RETURNING active, status",
        )
        .fetch_one(&mut pg)
        .await
        .unwrap();
        assert!(!defaults.get::<bool, _>(0));
        assert_eq!(defaults.get::<String, _>(1), "active");

        // シーケンスは最大値の次から採番される
        let next_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (customer_id, total) VALUES (2, 1.00) RETURNING id",
        )
        .fetch_one(&mut pg)
        .await
        .unwrap();
        assert_eq!(next_id, 4);

        // 外部キー違反は拒否される
        let violation = sqlx::query("INSERT INTO orders (customer_id, total) VALUES (42, 1.00)")
            .execute(&mut pg)
            .await;
        assert!(violation.is_err());

        let index_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pg_indexes WHERE indexname IN ('idx_customers_email_unique', 'idx_orders_customer_idx')",
        )
        .fetch_one(&mut pg)
        .await
        .unwrap();
        assert_eq!(index_count, 2);
    }

    /// 再実行では主キーのあるテーブルが取り込みで失敗することを確認
    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_rerun_fails_tables_with_primary_keys() {
        let (_mysql, source_config) = setup_mysql_container().await.unwrap();
        let (_postgres, target_config) = setup_postgres_container().await.unwrap();
        let output_dir = TempDir::new().unwrap();
        let service = DatabaseConnectionService::new();

        let mut orchestrator = MigrationOrchestrator::new(
            MySqlSource::new(service.connect_source(&source_config).await.unwrap(), "shop"),
            PostgresTarget::new(service.connect_target(&target_config).await.unwrap()),
            MigrationOptions {
                database: "shop".to_string(),
                output_dir: output_dir.path().to_path_buf(),
                tables: Some(vec!["customers".to_string()]),
            },
        );

        let first = orchestrator.run().await.unwrap();
        assert_eq!(first.succeeded_tables(), vec!["customers"]);

        let second = orchestrator.run().await.unwrap();
        assert_eq!(second.failed_tables(), vec!["customers"]);
    }

    /// COPY が失敗しても行単位の取り込みで全行が移行されることを確認
    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_row_by_row_fallback_preserves_values() {
        let (_mysql, source_config) = setup_mysql_container().await.unwrap();
        let (_postgres, target_config) = setup_postgres_container().await.unwrap();
        let output_dir = TempDir::new().unwrap();
        let service = DatabaseConnectionService::new();

        let target = CopyRejectingTarget(PostgresTarget::new(
            service.connect_target(&target_config).await.unwrap(),
        ));
        let mut orchestrator = MigrationOrchestrator::new(
            MySqlSource::new(service.connect_source(&source_config).await.unwrap(), "shop"),
            target,
            MigrationOptions {
                database: "shop".to_string(),
                output_dir: output_dir.path().to_path_buf(),
                tables: None,
            },
        );

        let report = orchestrator.run().await.unwrap();
        let (_, target) = orchestrator.into_parts();
        let mut pg: PgConnection = target.0.into_connection();

        assert_eq!(report.succeeded_tables(), vec!["customers", "orders"]);
        let customers = report.table("customers").unwrap();
        assert_eq!(customers.load_path, Some(LoadPath::RowByRow));
        assert_eq!(customers.rows_loaded, Some(3));
        assert!(customers.has_warning(Stage::Import));
        assert_eq!(report.table("orders").unwrap().rows_loaded, Some(3));
        assert!(report.foreign_key("orders_customer_fk").unwrap().is_created());

        let rows = sqlx::query("SELECT active, nickname, avatar FROM customers ORDER BY id")
            .fetch_all(&mut pg)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].get::<bool, _>(0));
        assert_eq!(rows[0].get::<Option<String>, _>(1), None);
        assert_eq!(rows[0].get::<Option<Vec<u8>>, _>(2), Some(vec![0xFF, 0x00]));
        assert!(!rows[1].get::<bool, _>(0));
        assert_eq!(rows[1].get::<Option<String>, _>(1), Some(String::new()));
        assert_eq!(rows[1].get::<Option<Vec<u8>>, _>(2), None);
        assert_eq!(rows[2].get::<Option<Vec<u8>>, _>(2), Some(Vec::new()));
    }
}
