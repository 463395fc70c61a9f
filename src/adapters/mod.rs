// Adapters
// 移行元・移行先データベースと中間ファイルへのアクセスを抽象化

pub mod artifact;
pub mod connection_options;
pub mod database;
pub mod default_expression;
pub mod mysql_source;
pub mod postgres_target;
pub mod sql_generator;
pub mod sql_quote;
pub mod type_mapping;
