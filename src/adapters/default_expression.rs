// デフォルト式の変換
//
// MySQLのデフォルト値をPostgreSQLのDEFAULT句に置き換えます。
// 関数呼び出しは式全体に対するアンカー付きパターンの表で変換し、部分一致による置換は行いません。
// リテラル値は移行先の型に合わせて真偽値・数値・文字列リテラルとして出力します。

use regex::Regex;
use std::sync::LazyLock;

use crate::adapters::sql_quote::quote_literal_postgres;
use crate::adapters::type_mapping::TargetType;

/// 変換規則（パターン, 置換後の式）
const RULES: &[(&str, &str)] = &[
    (r"^CURRENT_TIMESTAMP(\(\s*\d*\s*\))?$", "CURRENT_TIMESTAMP"),
    (r"^NOW\(\s*\d*\s*\)$", "CURRENT_TIMESTAMP"),
    (r"^LOCALTIMESTAMP(\(\s*\d*\s*\))?$", "CURRENT_TIMESTAMP"),
    (r"^LOCALTIME(\(\s*\d*\s*\))?$", "CURRENT_TIMESTAMP"),
    (r"^CURDATE\(\s*\)$", "CURRENT_DATE"),
    (r"^CURRENT_DATE(\(\s*\))?$", "CURRENT_DATE"),
    (r"^CURTIME\(\s*\d*\s*\)$", "CURRENT_TIME"),
    (r"^CURRENT_TIME(\(\s*\d*\s*\))?$", "CURRENT_TIME"),
    (r"^UUID\(\s*\)$", "gen_random_uuid()"),
];

static COMPILED_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(&format!("(?i){}", pattern))
                .ok()
                .map(|re| (re, *replacement))
        })
        .collect()
});

static NUMERIC_LITERAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").ok());

/// 関数呼び出しの規則表を適用（一致しなければ `None`）
fn translate_function(expr: &str) -> Option<String> {
    let trimmed = expr.trim();
    COMPILED_RULES
        .iter()
        .find(|(re, _)| re.is_match(trimmed))
        .map(|(_, replacement)| (*replacement).to_string())
}

/// 引用符で囲まれたリテラルの中身を取り出す
///
/// MySQL 8 は引用符なしで返しますが、MariaDB や古い版は `'...'` の形で返します。
fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed[1..trimmed.len() - 1].replace("''", "'")
    } else {
        value.to_string()
    }
}

/// 真偽値のリテラルを変換（`0`/`1`、`'0'`/`'1'`、`b'0'`/`b'1'`）
fn boolean_literal(value: &str) -> Option<&'static str> {
    let trimmed = value.trim();
    let bits = trimmed
        .strip_prefix("b'")
        .or_else(|| trimmed.strip_prefix("B'"))
        .and_then(|rest| rest.strip_suffix('\''));
    let raw = match bits {
        Some(bits) => bits.to_string(),
        None => unquote(trimmed),
    };

    match raw.trim().to_lowercase().as_str() {
        "0" | "false" => Some("FALSE"),
        "1" | "true" => Some("TRUE"),
        _ => None,
    }
}

fn is_numeric_type(target: TargetType) -> bool {
    matches!(
        target,
        TargetType::Integer
            | TargetType::SmallInt
            | TargetType::BigInt
            | TargetType::Real
            | TargetType::DoublePrecision
            | TargetType::Decimal
            | TargetType::Numeric
    )
}

fn is_temporal_type(target: TargetType) -> bool {
    matches!(
        target,
        TargetType::Date | TargetType::Timestamp | TargetType::Time
    )
}

/// デフォルト値をPostgreSQL向けに変換
///
/// # Arguments
///
/// * `value` - `information_schema.columns.COLUMN_DEFAULT` の値
/// * `target` - カラムの移行先の型
/// * `is_expression` - `EXTRA` に `DEFAULT_GENERATED` が付いた式デフォルトかどうか
///
/// 式デフォルトは規則表で変換し、規則に一致しなければそのまま返します。
/// リテラルは BOOLEAN なら `TRUE`/`FALSE`、数値型なら数値のまま、
/// それ以外は文字列リテラルとして引用符で囲みます。
/// 日時型のリテラルは `DEFAULT_GENERATED` を持たない版の `CURRENT_TIMESTAMP` も規則表で変換します。
///
/// # Examples
/// ```
/// use mysql2pg::adapters::default_expression::translate_default;
/// use mysql2pg::adapters::type_mapping::TargetType;
/// assert_eq!(translate_default("now()", TargetType::Timestamp, true), "CURRENT_TIMESTAMP");
/// assert_eq!(translate_default("0", TargetType::Boolean, false), "FALSE");
/// assert_eq!(translate_default("active", TargetType::Varchar(Some(10)), false), "'active'");
/// ```
pub fn translate_default(value: &str, target: TargetType, is_expression: bool) -> String {
    if target == TargetType::Boolean {
        if let Some(literal) = boolean_literal(value) {
            return literal.to_string();
        }
    }

    if is_expression {
        return translate_function(value).unwrap_or_else(|| value.to_string());
    }

    if is_temporal_type(target) {
        if let Some(function) = translate_function(value) {
            return function;
        }
    }

    let literal = unquote(value);
    let is_number = NUMERIC_LITERAL
        .as_ref()
        .is_some_and(|re| re.is_match(literal.trim()));
    if is_numeric_type(target) && is_number {
        return literal.trim().to_string();
    }

    quote_literal_postgres(&literal)
}
