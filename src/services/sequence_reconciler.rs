// シーケンス同期サービス
//
// データ取り込み後、シーケンスを既定値に持つカラムについて
// シーケンスの現在値をカラムの最大値に合わせます。

use tracing::{debug, warn};

use crate::core::outcome::StageOutcome;
use crate::services::traits::TargetSession;

/// シーケンス同期サービス
#[derive(Debug, Clone, Default)]
pub struct SequenceReconciler {}

impl SequenceReconciler {
    pub fn new() -> Self {
        Self {}
    }

    /// テーブルのシーケンスを同期
    ///
    /// 空テーブルでは次の採番が 1、非空では最大値 + 1 になるように設定します。
    /// 失敗は警告として返し、テーブルの移行は失敗扱いにしません。
    pub async fn reconcile<T>(&self, target: &mut T, table: &str) -> StageOutcome
    where
        T: TargetSession + ?Sized,
    {
        let sequences = match target.sequence_columns(table).await {
            Ok(sequences) => sequences,
            Err(e) => {
                warn!(table = %table, error = %e, "Failed to look up sequences");
                return StageOutcome::Warning(format!("sequence lookup failed: {}", e));
            }
        };

        let mut failures = Vec::new();
        for sequence in &sequences {
            match target.sync_sequence(table, sequence).await {
                Ok(()) => debug!(
                    table = %table,
                    column = %sequence.column_name,
                    sequence = %sequence.sequence_name,
                    "Sequence synchronized"
                ),
                Err(e) => {
                    warn!(table = %table, column = %sequence.column_name, error = %e, "Failed to synchronize sequence");
                    failures.push(format!("{}: {}", sequence.sequence_name, e));
                }
            }
        }

        StageOutcome::from_failures(failures)
    }
}
