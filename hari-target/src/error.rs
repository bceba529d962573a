//! ターゲット制御のエラー型

use crate::{Address, StopStatus};
use nix::errno::Errno;
use std::ffi::NulError;
use thiserror::Error;

/// トレース操作のエラー
///
/// 失敗したトレース操作はリトライせず、そのまま呼び出し元に返します。
#[derive(Debug, Error)]
pub enum TraceError {
    /// 実行可能ファイルのパスや引数にNULバイトが含まれている
    #[error("Invalid program argument: {0}")]
    InvalidArgument(#[from] NulError),

    /// fork自体に失敗した
    #[error("Failed to fork: {0}")]
    Fork(#[source] Errno),

    /// 起動直後の停止がSIGTRAPではなかった
    #[error("Target did not stop with SIGTRAP after launch: {0:?}")]
    NotTrapped(StopStatus),

    /// メモリの読み書きに失敗した
    #[error("Failed to {op} memory at {addr}: {source}")]
    Memory {
        op: &'static str,
        addr: Address,
        #[source]
        source: Errno,
    },

    /// レジスタ操作・実行再開・待機などのptrace呼び出しに失敗した
    #[error("{op} failed: {source}")]
    Ptrace {
        op: &'static str,
        #[source]
        source: Errno,
    },

    /// waitpidが想定外のステータスを返した
    #[error("Unexpected wait status: {0:#x}")]
    UnexpectedStatus(i32),

    /// /proc/<pid>/maps を読めなかった
    #[error("Failed to read {path}: {source}")]
    Maps {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// /proc/<pid>/maps の内容を解釈できなかった
    #[error("Malformed memory map entry: {0:?}")]
    MalformedMap(String),
}

impl TraceError {
    pub(crate) fn ptrace(op: &'static str) -> impl FnOnce(Errno) -> Self {
        move |source| Self::Ptrace { op, source }
    }
}
