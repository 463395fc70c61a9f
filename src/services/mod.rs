// Services Layer
// 移行処理を実行するサービス層

pub mod config_loader;
pub mod data_transfer;
pub mod migration_orchestrator;
pub mod report;
pub mod sequence_reconciler;
pub mod traits;
