// mysql2pgライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインモデル（設定、カタログ構造、移行結果、エラー型）
// - adapters: MySQL/PostgreSQL・中間ファイルへのアクセスとSQL生成
// - services: 移行の各ステージとオーケストレーション

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
