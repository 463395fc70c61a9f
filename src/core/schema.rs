// スキーマ記述子
//
// 移行元カタログから読み取ったテーブル構造を表現するデータ型と、
// カタログの生の行を制約・インデックス単位にまとめるグルーピング処理を提供します。

use serde::Serialize;
use std::collections::BTreeMap;

/// カラム記述子
///
/// 移行元の `information_schema.columns` の1行に対応します。
/// 読み取り後は変更されず、型マッピングとDDL生成で参照されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// カラム名
    pub name: String,
    /// 移行元のデータ型（`DATA_TYPE`、例: "varchar"）
    pub source_type: String,
    /// 文字型の最大長（`tinyint(1)` の場合は表示幅 1）
    pub max_length: Option<i64>,
    /// NULL許可フラグ
    pub nullable: bool,
    /// デフォルト値（`COLUMN_DEFAULT` のまま）
    pub default_expr: Option<String>,
    /// デフォルト値が式か（`EXTRA` の `DEFAULT_GENERATED`）
    pub default_is_expression: bool,
    /// AUTO_INCREMENT フラグ
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    /// 新しいカラム記述子を作成
    pub fn new(name: impl Into<String>, source_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            max_length: None,
            nullable,
            default_expr: None,
            default_is_expression: false,
            auto_increment: false,
        }
    }

    /// 最大長を設定
    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// リテラルのデフォルト値を設定
    pub fn with_default(mut self, default_expr: impl Into<String>) -> Self {
        self.default_expr = Some(default_expr.into());
        self.default_is_expression = false;
        self
    }

    /// 式のデフォルト値を設定
    pub fn with_default_expression(mut self, default_expr: impl Into<String>) -> Self {
        self.default_expr = Some(default_expr.into());
        self.default_is_expression = true;
        self
    }

    /// AUTO_INCREMENT を設定
    pub fn with_auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// 主キー定義（序数順のカラム名）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrimaryKeySpec {
    pub columns: Vec<String>,
}

impl PrimaryKeySpec {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// 外部キー定義
///
/// 複合外部キーはカタログ上で複数行になるため、制約名でまとめたものです。
/// `columns[i]` は `ref_columns[i]` を参照します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeySpec {
    /// 移行元の制約名
    pub constraint_name: String,
    /// 参照元テーブル
    pub table_name: String,
    /// 参照元カラム
    pub columns: Vec<String>,
    /// 参照先テーブル
    pub ref_table_name: String,
    /// 参照先カラム
    pub ref_columns: Vec<String>,
}

/// インデックス定義（主キーインデックスを除く）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    /// 移行元のインデックス名
    pub index_name: String,
    /// インデックス内の位置順のカラム
    pub columns: Vec<String>,
    /// ユニークインデックスかどうか
    pub is_unique: bool,
}

/// 制約名 → 外部キー定義
pub type ForeignKeyMap = BTreeMap<String, ForeignKeySpec>;

/// インデックス名 → インデックス定義
pub type IndexMap = BTreeMap<String, IndexSpec>;

/// `KEY_COLUMN_USAGE` から読み取った外部キーの1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRow {
    pub table_name: String,
    pub column_name: String,
    pub constraint_name: String,
    pub ref_table_name: String,
    pub ref_column_name: String,
}

impl ForeignKeyRow {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        constraint_name: impl Into<String>,
        ref_table_name: impl Into<String>,
        ref_column_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            constraint_name: constraint_name.into(),
            ref_table_name: ref_table_name.into(),
            ref_column_name: ref_column_name.into(),
        }
    }
}

/// `STATISTICS` から読み取ったインデックスの1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub index_name: String,
    pub column_name: String,
    /// カタログの NON_UNIQUE フラグ（0 ならユニーク）
    pub non_unique: i64,
}

impl IndexRow {
    pub fn new(index_name: impl Into<String>, column_name: impl Into<String>, non_unique: i64) -> Self {
        Self {
            index_name: index_name.into(),
            column_name: column_name.into(),
            non_unique,
        }
    }
}

/// 外部キーの行を制約名でグループ化
///
/// 同じ制約名の行は複合外部キーの構成要素として、出現順にカラムと参照カラムを追加します。
/// テーブル名と参照先テーブルは最初の行のものを採用します。
pub fn group_foreign_keys(rows: impl IntoIterator<Item = ForeignKeyRow>) -> ForeignKeyMap {
    let mut foreign_keys = ForeignKeyMap::new();

    for row in rows {
        let entry = foreign_keys
            .entry(row.constraint_name.clone())
            .or_insert_with(|| ForeignKeySpec {
                constraint_name: row.constraint_name.clone(),
                table_name: row.table_name.clone(),
                columns: Vec::new(),
                ref_table_name: row.ref_table_name.clone(),
                ref_columns: Vec::new(),
            });
        entry.columns.push(row.column_name);
        entry.ref_columns.push(row.ref_column_name);
    }

    foreign_keys
}

/// インデックスの行をインデックス名でグループ化
///
/// ユニーク性は最初の行の NON_UNIQUE フラグから決まります（0 ならユニーク）。
pub fn group_indexes(rows: impl IntoIterator<Item = IndexRow>) -> IndexMap {
    let mut indexes = IndexMap::new();

    for row in rows {
        let entry = indexes
            .entry(row.index_name.clone())
            .or_insert_with(|| IndexSpec {
                index_name: row.index_name.clone(),
                columns: Vec::new(),
                is_unique: row.non_unique == 0,
            });
        entry.columns.push(row.column_name);
    }

    indexes
}

/// 1テーブル分の移行元スキーマ
///
/// テーブル処理の開始時に読み取り、処理完了後に破棄します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: PrimaryKeySpec,
    pub indexes: IndexMap,
}
