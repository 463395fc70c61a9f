// SQL識別子クォートユーティリティ
//
// 移行元（MySQL）と移行先（PostgreSQL）の識別子クォート関数を提供します。
// sql_generator、mysql_source、postgres_target から共有されます。

/// PostgreSQL用識別子クォート（ダブルクォート）
///
/// 識別子内のダブルクォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use mysql2pg::adapters::sql_quote::quote_identifier_postgres;
/// assert_eq!(quote_identifier_postgres("orders"), r#""orders""#);
/// assert_eq!(quote_identifier_postgres(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_identifier_postgres(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// MySQL用識別子クォート（バッククォート）
///
/// 識別子内のバッククォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use mysql2pg::adapters::sql_quote::quote_identifier_mysql;
/// assert_eq!(quote_identifier_mysql("orders"), "`orders`");
/// assert_eq!(quote_identifier_mysql("odd`name"), "`odd``name`");
/// ```
pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// カラム名リストをクォートしてカンマ区切りで結合（PostgreSQL用）
pub fn quote_columns_postgres(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier_postgres(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// カラム名リストをクォートしてカンマ区切りで結合（MySQL用）
pub fn quote_columns_mysql(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier_mysql(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// PostgreSQL用文字列リテラルクォート（シングルクォート）
///
/// COPY のオプション値など、パラメータをバインドできない位置で使用します。
pub fn quote_literal_postgres(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
