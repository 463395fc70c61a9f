// SQL生成アダプター
//
// 移行元のスキーマ記述子から移行先（PostgreSQL）のDDL文・DML文を生成するアダプター層。

pub mod postgres;

pub use postgres::PostgresSqlGenerator;

use crate::adapters::sql_quote::quote_identifier_postgres;
use crate::core::schema::ColumnDescriptor;

/// カラム定義の共通組み立てヘルパー
///
/// `"name" TYPE NULL|NOT NULL [DEFAULT expr]` の順で組み立てます。
pub(crate) fn build_column_definition(
    column: &ColumnDescriptor,
    type_str: &str,
    default_expr: Option<&str>,
) -> String {
    let mut parts = vec![quote_identifier_postgres(&column.name), type_str.to_string()];

    if column.nullable {
        parts.push("NULL".to_string());
    } else {
        parts.push("NOT NULL".to_string());
    }

    if let Some(default_value) = default_expr {
        parts.push(format!("DEFAULT {}", default_value));
    }

    parts.join(" ")
}
