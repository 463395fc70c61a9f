// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// mysql2pg - MySQL to PostgreSQL migration CLI
///
/// Copies table definitions, rows, keys, indexes and sequences
/// from a MySQL database into a PostgreSQL database in one run.
#[derive(Parser, Debug)]
#[command(name = "mysql2pg")]
#[command(author = "mysql2pg Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "One-shot MySQL to PostgreSQL schema and data migration")]
#[command(long_about = "mysql2pg - MySQL to PostgreSQL migration CLI

Reads the MySQL catalog, recreates each table in PostgreSQL,
copies its rows through a CSV file and then adds primary keys,
indexes, foreign keys and sequence positions.

Each table is migrated independently: a failure is recorded
in the migration report and the run continues with the next table.")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Write .mysql2pg.yaml with source and target connections
  2. Run the migration:             mysql2pg migrate
  3. Read the report:               cat migration_report.txt

For detailed help on each command, use: mysql2pg <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate schema and data from MySQL to PostgreSQL
    ///
    /// Connection settings are read from the config file and can be
    /// overridden per flag. Passwords fall back to MYSQL_PWD and PGPASSWORD.
    ///
    /// EXAMPLES:
    ///   # Migrate everything described in .mysql2pg.yaml
    ///   mysql2pg migrate
    ///
    ///   # Migrate two tables only
    ///   mysql2pg migrate --tables customers,orders
    ///
    ///   # Without a config file
    ///   mysql2pg migrate --mysql-database shop --pg-database shop
    Migrate {
        /// MySQL host
        #[arg(long, value_name = "HOST")]
        mysql_host: Option<String>,

        /// MySQL port
        #[arg(long, value_name = "PORT")]
        mysql_port: Option<u16>,

        /// MySQL user
        #[arg(long, value_name = "USER")]
        mysql_user: Option<String>,

        /// MySQL password
        #[arg(long, value_name = "PASSWORD")]
        mysql_password: Option<String>,

        /// MySQL database to migrate
        #[arg(long, value_name = "DATABASE")]
        mysql_database: Option<String>,

        /// PostgreSQL host
        #[arg(long, value_name = "HOST")]
        pg_host: Option<String>,

        /// PostgreSQL port
        #[arg(long, value_name = "PORT")]
        pg_port: Option<u16>,

        /// PostgreSQL user
        #[arg(long, value_name = "USER")]
        pg_user: Option<String>,

        /// PostgreSQL password
        #[arg(long, value_name = "PASSWORD")]
        pg_password: Option<String>,

        /// PostgreSQL database to load into
        #[arg(long, value_name = "DATABASE")]
        pg_database: Option<String>,

        /// Migrate only these tables (comma separated)
        #[arg(long, value_name = "TABLES", value_delimiter = ',')]
        tables: Option<Vec<String>>,

        /// Directory for the intermediate CSV files
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Path of the migration report
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Connection timeout in seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },
}
