//! hari ターゲットプロセス制御
//!
//! このクレートは、デバッグ対象のプロセスを制御するための低レベル機能を提供します。
//! プロセスの起動、ptraceによるレジスタ・メモリアクセス、実行再開と停止待機を行います。

pub mod address;
pub mod breakpoint;
pub mod error;
pub mod memory;
pub mod process;
pub mod registers;
pub mod trace;

pub use address::{Address, Word};
pub use breakpoint::{patch_trap, TRAP_OPCODE, TRAP_OPCODE_LEN};
pub use error::TraceError;
pub use memory::Memory;
pub use process::{Process, StopStatus};
pub use registers::{RegisterFile, Registers};
pub use trace::{ResumeMode, Tracee};

// シグナル番号の定数を扱う側のために再エクスポート
pub use nix::sys::signal::Signal;

/// ターゲット制御の結果型
pub type Result<T> = std::result::Result<T, TraceError>;
