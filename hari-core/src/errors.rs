//! デバッガのエラー型

use hari_target::{Address, TraceError};
use thiserror::Error;

/// デバッガのエラー
#[derive(Debug, Error)]
pub enum DebugError {
    /// オフセット文字列を16進数として解釈できない
    #[error("Invalid offset '{0}'")]
    InvalidOffset(String),

    /// ベースアドレスにオフセットを加えた結果が有効なアドレスにならない
    #[error("Offset {offset:#x} is out of range from base {base}")]
    AddressOutOfRange { base: Address, offset: i64 },

    /// ブレークポイントが既に有効化されている
    #[error("Breakpoint at {0} is already armed")]
    AlreadyArmed(Address),

    /// 有効化されていないブレークポイントを解除しようとした
    #[error("No armed breakpoint to disarm")]
    NotArmed,

    /// ターゲットがコマンドを受け付けられる状態ではない
    #[error("Target is not stopped at a trap")]
    NotInteractive,

    /// トレース操作の失敗
    #[error(transparent)]
    Trace(#[from] TraceError),
}
