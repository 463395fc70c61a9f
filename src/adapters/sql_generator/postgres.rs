// PostgreSQL用SQLジェネレーター
//
// 移行元のスキーマ記述子からPostgreSQL用のDDL文と、
// データ取り込み・シーケンス同期用のSQL文を生成します。

use std::collections::HashMap;

use crate::adapters::artifact::NULL_MARKER;
use crate::adapters::default_expression::translate_default;
use crate::adapters::sql_generator::build_column_definition;
use crate::adapters::sql_quote::{
    quote_columns_postgres, quote_identifier_postgres, quote_literal_postgres,
};
use crate::adapters::type_mapping::map_type;
use crate::core::naming::{
    tail_chars, FOREIGN_KEY_PREFIX, FOREIGN_KEY_SUFFIX_CHARS, INDEX_PREFIX, PRIMARY_KEY_PREFIX,
};
use crate::core::schema::{ColumnDescriptor, ForeignKeySpec, IndexSpec, PrimaryKeySpec};

/// PostgreSQL用SQLジェネレーター
#[derive(Debug, Clone, Default)]
pub struct PostgresSqlGenerator {}

impl PostgresSqlGenerator {
    /// 新しいPostgresSqlGeneratorを作成
    pub fn new() -> Self {
        Self {}
    }

    /// カラムの型文字列を決定
    ///
    /// AUTO_INCREMENT の整数カラムは SERIAL 系の型になります。
    fn column_type_sql(&self, column: &ColumnDescriptor) -> (String, bool) {
        let target_type = map_type(&column.source_type, column.max_length);
        match target_type.serial_type() {
            Some(serial) if column.auto_increment => (serial.to_string(), true),
            _ => (target_type.to_string(), false),
        }
    }

    /// カラムのDEFAULT句の式を決定（移行先の型に合わせて変換）
    fn column_default_sql(&self, column: &ColumnDescriptor) -> Option<String> {
        let target_type = map_type(&column.source_type, column.max_length);
        column
            .default_expr
            .as_deref()
            .map(|value| translate_default(value, target_type, column.default_is_expression))
    }

    /// CREATE TABLE文を生成
    ///
    /// # Arguments
    ///
    /// * `table` - テーブル名
    /// * `columns` - 序数順のカラム記述子
    ///
    /// # Returns
    ///
    /// `CREATE TABLE IF NOT EXISTS` 文（1カラム1行）
    pub fn generate_create_table(&self, table: &str, columns: &[ColumnDescriptor]) -> String {
        let column_defs: Vec<String> = columns
            .iter()
            .map(|column| {
                let (type_sql, is_serial) = self.column_type_sql(column);
                // SERIAL 系はシーケンスのデフォルトを自前で持つ
                let default_expr = if is_serial {
                    None
                } else {
                    self.column_default_sql(column)
                };
                format!(
                    "    {}",
                    build_column_definition(column, &type_sql, default_expr.as_deref())
                )
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            quote_identifier_postgres(table),
            column_defs.join(",\n")
        )
    }

    /// 主キー制約名を生成
    pub fn primary_key_name(&self, table: &str) -> String {
        format!("{}_{}", PRIMARY_KEY_PREFIX, table)
    }

    /// 主キー追加文を生成（主キーがなければ `None`）
    pub fn generate_primary_key(&self, table: &str, primary_key: &PrimaryKeySpec) -> Option<String> {
        if primary_key.is_empty() {
            return None;
        }

        Some(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            quote_identifier_postgres(table),
            quote_identifier_postgres(&self.primary_key_name(table)),
            quote_columns_postgres(&primary_key.columns)
        ))
    }

    /// 外部キー制約名を生成
    ///
    /// `fk_<table>_<参照先テーブル>_<元の制約名の末尾10文字>`
    pub fn foreign_key_name(&self, foreign_key: &ForeignKeySpec) -> String {
        format!(
            "{}_{}_{}_{}",
            FOREIGN_KEY_PREFIX,
            foreign_key.table_name,
            foreign_key.ref_table_name,
            tail_chars(&foreign_key.constraint_name, FOREIGN_KEY_SUFFIX_CHARS)
        )
    }

    /// 外部キー追加文を生成
    pub fn generate_foreign_key(&self, foreign_key: &ForeignKeySpec) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_identifier_postgres(&foreign_key.table_name),
            quote_identifier_postgres(&self.foreign_key_name(foreign_key)),
            quote_columns_postgres(&foreign_key.columns),
            quote_identifier_postgres(&foreign_key.ref_table_name),
            quote_columns_postgres(&foreign_key.ref_columns)
        )
    }

    /// インデックス名を生成
    pub fn index_name(&self, table: &str, index: &IndexSpec) -> String {
        format!("{}_{}_{}", INDEX_PREFIX, table, index.index_name)
    }

    /// CREATE INDEX文を生成
    pub fn generate_create_index(&self, table: &str, index: &IndexSpec) -> String {
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
            quote_identifier_postgres(&self.index_name(table, index)),
            quote_identifier_postgres(table),
            quote_columns_postgres(&index.columns)
        )
    }

    /// 中間ファイル取り込み用の COPY 文を生成
    pub fn generate_copy_from_stdin(&self, table: &str, columns: &[String]) -> String {
        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, HEADER true, NULL {})",
            quote_identifier_postgres(table),
            quote_columns_postgres(columns),
            quote_literal_postgres(NULL_MARKER)
        )
    }

    /// 複数行INSERT文を生成
    ///
    /// 各プレースホルダーは移行先カラムの宣言型へキャストします。
    /// 型が分からないカラムはキャストなしのプレースホルダーになります。
    ///
    /// # Arguments
    ///
    /// * `table` - テーブル名
    /// * `columns` - 中間ファイルのヘッダー順のカラム名
    /// * `column_types` - カラム名 → 移行先の型名
    /// * `row_count` - VALUES句の行数
    pub fn generate_insert_batch(
        &self,
        table: &str,
        columns: &[String],
        column_types: &HashMap<String, String>,
        row_count: usize,
    ) -> String {
        let mut param_index = 0;
        let values: Vec<String> = (0..row_count)
            .map(|_| {
                let placeholders: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        param_index += 1;
                        match column_types.get(column) {
                            Some(type_name) => format!("CAST(${} AS {})", param_index, type_name),
                            None => format!("${}", param_index),
                        }
                    })
                    .collect();
                format!("({})", placeholders.join(", "))
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_identifier_postgres(table),
            quote_columns_postgres(columns),
            values.join(", ")
        )
    }

    /// 行数取得文を生成
    pub fn generate_row_count(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", quote_identifier_postgres(table))
    }

    /// シーケンス同期文を生成
    ///
    /// シーケンス名は `$1` にバインドします。空テーブルでは 1 に設定し is_called を false にするため、
    /// 次の採番はどちらの場合も正しく1つ先の値になります。
    pub fn generate_sync_sequence(&self, table: &str, column: &str) -> String {
        let quoted_column = quote_identifier_postgres(column);
        format!(
            "SELECT setval($1::regclass, COALESCE(MAX({col}), 1), MAX({col}) IS NOT NULL) FROM {table}",
            col = quoted_column,
            table = quote_identifier_postgres(table)
        )
    }
}
