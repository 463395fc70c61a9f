// Core Domain
// スキーマ記述子、移行結果モデル、設定、エラー型などの純粋なドメイン定義

pub mod config;
pub mod error;
pub mod naming;
pub mod outcome;
pub mod schema;
