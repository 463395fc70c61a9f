//! 統合テスト用のインメモリ移行元・移行先
//!
//! FakeSource はテーブル定義と行をメモリ上に持ち、中間ファイルへ書き出します。
//! FakeTarget は実行されたSQLを記録し、制約・インデックスの重複や
//! 主キー違反を PostgreSQL と同じようにエラーにします。
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use mysql2pg::adapters::artifact::{ArtifactReader, ArtifactWriter, CellValue};
use mysql2pg::core::error::{DatabaseError, TransferError};
use mysql2pg::core::schema::{
    ColumnDescriptor, ForeignKeyMap, ForeignKeySpec, IndexMap, IndexSpec, PrimaryKeySpec,
};
use mysql2pg::services::traits::{RowExporter, SequenceColumn, SourceCatalog, TargetSession};

/// 移行元の1テーブル
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: PrimaryKeySpec,
    pub indexes: IndexMap,
    pub rows: Vec<Vec<CellValue>>,
}

impl SourceTable {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = PrimaryKeySpec::new(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_index(mut self, name: &str, columns: &[&str], is_unique: bool) -> Self {
        self.indexes.insert(
            name.to_string(),
            IndexSpec {
                index_name: name.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
                is_unique,
            },
        );
        self
    }

    pub fn with_rows(mut self, rows: Vec<Vec<CellValue>>) -> Self {
        self.rows = rows;
        self
    }
}

/// インメモリの移行元
#[derive(Debug, Default)]
pub struct FakeSource {
    pub tables: BTreeMap<String, SourceTable>,
    pub foreign_keys: ForeignKeyMap,
    pub fail_export: HashSet<String>,
    pub fail_list_tables: bool,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: SourceTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    pub fn with_foreign_key(
        mut self,
        constraint_name: &str,
        table_name: &str,
        columns: &[&str],
        ref_table_name: &str,
        ref_columns: &[&str],
    ) -> Self {
        self.foreign_keys.insert(
            constraint_name.to_string(),
            ForeignKeySpec {
                constraint_name: constraint_name.to_string(),
                table_name: table_name.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
                ref_table_name: ref_table_name.to_string(),
                ref_columns: ref_columns.iter().map(|c| c.to_string()).collect(),
            },
        );
        self
    }
}

#[async_trait]
impl SourceCatalog for FakeSource {
    async fn list_tables(&mut self) -> Result<Vec<String>, DatabaseError> {
        if self.fail_list_tables {
            return Err(DatabaseError::Connection {
                message: "Lost connection to MySQL server".to_string(),
                cause: "broken pipe".to_string(),
            });
        }
        Ok(self.tables.keys().cloned().collect())
    }

    async fn get_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn get_primary_key(&mut self, table: &str) -> Result<PrimaryKeySpec, DatabaseError> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.primary_key.clone())
            .unwrap_or_default())
    }

    async fn get_foreign_keys(&mut self, _database: &str) -> Result<ForeignKeyMap, DatabaseError> {
        Ok(self.foreign_keys.clone())
    }

    async fn get_indexes(&mut self, table: &str) -> Result<IndexMap, DatabaseError> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.indexes.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RowExporter for FakeSource {
    async fn export_rows(
        &mut self,
        table: &str,
        _columns: &[ColumnDescriptor],
        batch_size: usize,
        writer: &mut ArtifactWriter,
    ) -> Result<u64, TransferError> {
        if self.fail_export.contains(table) {
            return Err(TransferError::export(table, "Lost connection during query"));
        }

        let rows = self
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default();
        for batch in rows.chunks(batch_size) {
            writer.write_batch(batch)?;
        }
        Ok(rows.len() as u64)
    }
}

/// 移行先の1テーブル
#[derive(Debug, Clone, Default)]
pub struct TargetTable {
    /// (カラム名, 型名)
    pub columns: Vec<(String, String)>,
    pub primary_key: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TargetTable {
    /// カラムの値を行順に取得
    pub fn column_values(&self, column: &str) -> Vec<Option<String>> {
        let Some(pos) = self.columns.iter().position(|(name, _)| name == column) else {
            return Vec::new();
        };
        self.rows.iter().map(|row| row[pos].clone()).collect()
    }
}

/// インメモリの移行先
#[derive(Debug, Default)]
pub struct FakeTarget {
    pub tables: HashMap<String, TargetTable>,
    /// 作成済みの制約名とインデックス名
    pub objects: HashSet<String>,
    pub executed: Vec<String>,
    pub fail_create: HashSet<String>,
    pub fail_bulk_copy: bool,
    pub fail_sequences: bool,
    pub insert_batch_sizes: Vec<usize>,
    pub synced_sequences: Vec<String>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&TargetTable> {
        self.tables.get(name)
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains(name)
    }

    fn create_table(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let name = quoted_identifiers(sql)
            .into_iter()
            .next()
            .unwrap_or_default();
        if self.fail_create.contains(&name) {
            return Err(DatabaseError::query(
                format!("type \"unknown\" does not exist (table {})", name),
                sql,
            ));
        }

        let columns = sql
            .lines()
            .filter(|line| line.starts_with("    \""))
            .filter_map(|line| {
                let rest = line.trim_start().strip_prefix('"')?;
                let end = rest.find('"')?;
                let type_name = rest[end + 1..].split_whitespace().next()?;
                Some((rest[..end].to_string(), type_name.to_string()))
            })
            .collect();

        self.tables.entry(name).or_insert_with(|| TargetTable {
            columns,
            ..Default::default()
        });
        Ok(())
    }

    fn add_object(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let idents = quoted_identifiers(sql);
        let (table, name) = if sql.starts_with("ALTER TABLE") {
            (idents[0].clone(), idents[1].clone())
        } else {
            (idents[1].clone(), idents[0].clone())
        };

        if !self.tables.contains_key(&table) {
            return Err(DatabaseError::query(
                format!("relation \"{}\" does not exist", table),
                sql,
            ));
        }
        if self.objects.contains(&name) {
            return Err(DatabaseError::query(
                format!("relation \"{}\" already exists", name),
                sql,
            ));
        }

        if sql.contains("FOREIGN KEY") {
            let ref_table = sql
                .split("REFERENCES ")
                .nth(1)
                .and_then(|rest| quoted_identifiers(rest).into_iter().next())
                .unwrap_or_default();
            if !self.tables.contains_key(&ref_table) {
                return Err(DatabaseError::query(
                    format!("relation \"{}\" does not exist", ref_table),
                    sql,
                ));
            }
        }

        if sql.contains("PRIMARY KEY") {
            let columns = idents[2..].to_vec();
            let target = self.tables.get_mut(&table);
            if let Some(target) = target {
                if has_duplicates(target, &columns) {
                    return Err(DatabaseError::query(
                        format!("could not create unique index \"{}\"", name),
                        sql,
                    ));
                }
                target.primary_key = columns;
            }
        }

        self.objects.insert(name);
        Ok(())
    }

    fn append_rows(
        &mut self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<u64, String> {
        let target = self
            .tables
            .get_mut(table)
            .ok_or_else(|| format!("relation \"{}\" does not exist", table))?;

        // ヘッダー順から移行先のカラム順に並べ替える
        let mut ordered = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = vec![None; target.columns.len()];
            for (column, value) in columns.iter().zip(row) {
                let pos = target
                    .columns
                    .iter()
                    .position(|(name, _)| name == column)
                    .ok_or_else(|| format!("column \"{}\" does not exist", column))?;
                values[pos] = value;
            }
            ordered.push(values);
        }

        let mut candidate = target.clone();
        candidate.rows.extend(ordered);
        if has_duplicates(&candidate, &target.primary_key) {
            return Err("duplicate key value violates unique constraint".to_string());
        }

        let count = candidate.rows.len() - target.rows.len();
        *target = candidate;
        Ok(count as u64)
    }
}

#[async_trait]
impl TargetSession for FakeTarget {
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.executed.push(sql.to_string());
        if sql.starts_with("CREATE TABLE") {
            self.create_table(sql)
        } else if sql.starts_with("ALTER TABLE") || sql.contains("INDEX") {
            self.add_object(sql)
        } else {
            Ok(())
        }
    }

    async fn bulk_copy(
        &mut self,
        table: &str,
        columns: &[String],
        artifact: &Path,
    ) -> Result<u64, TransferError> {
        if self.fail_bulk_copy {
            return Err(TransferError::bulk_load(
                table,
                "invalid byte sequence for encoding \"UTF8\"",
            ));
        }

        let mut reader = ArtifactReader::open(artifact)?;
        let mut rows = Vec::new();
        loop {
            let batch = reader.next_batch(1000)?;
            if batch.is_empty() {
                break;
            }
            rows.extend(batch);
        }

        self.append_rows(table, columns, rows)
            .map_err(|e| TransferError::bulk_load(table, e))
    }

    async fn column_types(&mut self, table: &str) -> Result<HashMap<String, String>, DatabaseError> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.columns.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_batch(
        &mut self,
        table: &str,
        columns: &[String],
        _column_types: &HashMap<String, String>,
        rows: &[Vec<Option<String>>],
    ) -> Result<u64, DatabaseError> {
        self.insert_batch_sizes.push(rows.len());
        self.append_rows(table, columns, rows.to_vec())
            .map_err(|e| DatabaseError::query(e, format!("INSERT INTO {} ...", table)))
    }

    async fn row_count(&mut self, table: &str) -> Result<i64, DatabaseError> {
        self.tables
            .get(table)
            .map(|t| t.rows.len() as i64)
            .ok_or_else(|| DatabaseError::query("relation does not exist", table))
    }

    async fn sequence_columns(&mut self, table: &str) -> Result<Vec<SequenceColumn>, DatabaseError> {
        Ok(self
            .tables
            .get(table)
            .map(|t| {
                t.columns
                    .iter()
                    .filter(|(_, type_name)| type_name.ends_with("SERIAL"))
                    .map(|(column, _)| SequenceColumn {
                        column_name: column.clone(),
                        sequence_name: format!("public.{}_{}_seq", table, column),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn sync_sequence(
        &mut self,
        _table: &str,
        sequence: &SequenceColumn,
    ) -> Result<(), DatabaseError> {
        if self.fail_sequences {
            return Err(DatabaseError::query(
                "permission denied for sequence",
                "SELECT setval(...)",
            ));
        }
        self.synced_sequences.push(sequence.sequence_name.clone());
        Ok(())
    }
}

/// SQL中のダブルクォートで囲まれた識別子を出現順に取り出す
fn quoted_identifiers(sql: &str) -> Vec<String> {
    sql.split('"')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, ident)| ident.to_string())
        .collect()
}

fn has_duplicates(table: &TargetTable, key: &[String]) -> bool {
    if key.is_empty() {
        return false;
    }
    let positions: Vec<usize> = key
        .iter()
        .filter_map(|k| table.columns.iter().position(|(name, _)| name == k))
        .collect();
    let mut seen = HashSet::new();
    table
        .rows
        .iter()
        .any(|row| !seen.insert(positions.iter().map(|&p| row[p].clone()).collect::<Vec<_>>()))
}

/// テキストセルの行を作成
pub fn text_row(values: &[&str]) -> Vec<CellValue> {
    values
        .iter()
        .map(|v| CellValue::Text(v.to_string()))
        .collect()
}
