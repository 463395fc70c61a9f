// 命名ポリシー
//
// アプリケーション名と既定のパス、生成オブジェクト名の接頭辞の単一ソースを提供します。

/// 現行アプリケーション名
pub const APP_NAME: &str = "mysql2pg";

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".mysql2pg.yaml";

/// 中間ファイルの既定出力ディレクトリ
pub const DEFAULT_OUTPUT_DIR: &str = "./exported_data";

/// 移行レポートの既定ファイル名
pub const DEFAULT_REPORT_FILE: &str = "migration_report.txt";

/// 中間ファイルの拡張子
pub const ARTIFACT_EXTENSION: &str = "csv";

/// 主キー制約名の接頭辞
pub const PRIMARY_KEY_PREFIX: &str = "pk";

/// 外部キー制約名の接頭辞
pub const FOREIGN_KEY_PREFIX: &str = "fk";

/// インデックス名の接頭辞
pub const INDEX_PREFIX: &str = "idx";

/// 外部キー名に残す元制約名の末尾文字数
pub const FOREIGN_KEY_SUFFIX_CHARS: usize = 10;

/// 文字列の末尾 `count` 文字を返す（バイトではなく文字単位）
pub fn tail_chars(value: &str, count: usize) -> &str {
    let total = value.chars().count();
    if total <= count {
        return value;
    }
    let skip = total - count;
    match value.char_indices().nth(skip) {
        Some((offset, _)) => &value[offset..],
        None => value,
    }
}
