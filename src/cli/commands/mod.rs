// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod migrate;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::OutputFormat;

/// テキスト出力を持つコマンド結果
pub trait CommandOutput {
    /// テキスト形式に整形
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じてコマンド結果を文字列化
pub fn render_output<T>(output: &T, format: &OutputFormat) -> Result<String>
where
    T: CommandOutput + Serialize,
{
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).context("Failed to serialize output as JSON")
        }
    }
}
