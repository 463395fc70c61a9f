use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use mysql2pg::cli::commands::migrate::{ConnectionOverrides, MigrateCommand, MigrateCommandHandler};
use mysql2pg::cli::{Cli, Commands};
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する（標準出力はコマンド結果用に空けておく）
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = if verbose { "mysql2pg=debug" } else { "mysql2pg=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    // --config フラグの処理（絶対パスに変換）
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            project_path.join(p)
        }
    });

    match cli.command {
        Commands::Migrate {
            mysql_host,
            mysql_port,
            mysql_user,
            mysql_password,
            mysql_database,
            pg_host,
            pg_port,
            pg_user,
            pg_password,
            pg_database,
            tables,
            output_dir,
            report,
            timeout,
        } => {
            let handler = MigrateCommandHandler::new();
            let command = MigrateCommand {
                project_path,
                config_path,
                source: ConnectionOverrides {
                    host: mysql_host,
                    port: mysql_port,
                    user: mysql_user,
                    password: mysql_password,
                    database: mysql_database,
                },
                target: ConnectionOverrides {
                    host: pg_host,
                    port: pg_port,
                    user: pg_user,
                    password: pg_password,
                    database: pg_database,
                },
                tables,
                output_dir,
                report_path: report,
                timeout,
                format: cli.format,
            };
            handler.execute(&command).await
        }
    }
}
