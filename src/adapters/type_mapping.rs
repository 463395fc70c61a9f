// 型マッピング
//
// MySQLのデータ型をPostgreSQLのデータ型に変換します。
// 未知の型は TEXT にフォールバックするため、変換は失敗しません。

use serde::Serialize;
use std::fmt;

/// 移行先（PostgreSQL）のカラム型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetType {
    Integer,
    SmallInt,
    BigInt,
    Real,
    DoublePrecision,
    Decimal,
    Numeric,
    Date,
    Timestamp,
    Time,
    /// 長さ指定付きの固定長文字列（長さ不明なら `CHAR`）
    Char(Option<i64>),
    /// 長さ指定付きの可変長文字列（長さ不明なら `VARCHAR`）
    Varchar(Option<i64>),
    Bytea,
    Text,
    Boolean,
    Jsonb,
}

impl TargetType {
    /// バイナリ型かどうか
    ///
    /// エクスポート時に16進エンコードが必要な型を判定します。
    pub fn is_binary(&self) -> bool {
        matches!(self, TargetType::Bytea)
    }

    /// AUTO_INCREMENT カラムに対応する SERIAL 系の型名
    ///
    /// 整数型以外は `None` を返します。
    pub fn serial_type(&self) -> Option<&'static str> {
        match self {
            TargetType::SmallInt => Some("SMALLSERIAL"),
            TargetType::Integer => Some("SERIAL"),
            TargetType::BigInt => Some("BIGSERIAL"),
            _ => None,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Integer => write!(f, "INTEGER"),
            TargetType::SmallInt => write!(f, "SMALLINT"),
            TargetType::BigInt => write!(f, "BIGINT"),
            TargetType::Real => write!(f, "REAL"),
            TargetType::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            TargetType::Decimal => write!(f, "DECIMAL"),
            TargetType::Numeric => write!(f, "NUMERIC"),
            TargetType::Date => write!(f, "DATE"),
            TargetType::Timestamp => write!(f, "TIMESTAMP"),
            TargetType::Time => write!(f, "TIME"),
            TargetType::Char(Some(length)) => write!(f, "CHAR({})", length),
            TargetType::Char(None) => write!(f, "CHAR"),
            TargetType::Varchar(Some(length)) => write!(f, "VARCHAR({})", length),
            TargetType::Varchar(None) => write!(f, "VARCHAR"),
            TargetType::Bytea => write!(f, "BYTEA"),
            TargetType::Text => write!(f, "TEXT"),
            TargetType::Boolean => write!(f, "BOOLEAN"),
            TargetType::Jsonb => write!(f, "JSONB"),
        }
    }
}

/// MySQLの型名と最大長からPostgreSQLの型を決定
///
/// # Arguments
///
/// * `source_type` - `information_schema.columns.DATA_TYPE` の値（大文字小文字は区別しない）
/// * `max_length` - 文字型の最大長。`tinyint(1)` の場合は 1
///
/// # Returns
///
/// 対応する移行先の型。未知の型は `TargetType::Text`
pub fn map_type(source_type: &str, max_length: Option<i64>) -> TargetType {
    match source_type.trim().to_lowercase().as_str() {
        "int" | "integer" | "mediumint" | "year" => TargetType::Integer,
        "tinyint" if max_length == Some(1) => TargetType::Boolean,
        "tinyint" | "smallint" => TargetType::SmallInt,
        "bigint" => TargetType::BigInt,
        "float" => TargetType::Real,
        "double" => TargetType::DoublePrecision,
        "decimal" => TargetType::Decimal,
        "numeric" => TargetType::Numeric,
        "date" => TargetType::Date,
        "datetime" | "timestamp" => TargetType::Timestamp,
        "time" => TargetType::Time,
        "char" => TargetType::Char(max_length),
        "varchar" => TargetType::Varchar(max_length),
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            TargetType::Bytea
        }
        "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set" => TargetType::Text,
        "boolean" | "bool" => TargetType::Boolean,
        "json" => TargetType::Jsonb,
        _ => TargetType::Text,
    }
}
