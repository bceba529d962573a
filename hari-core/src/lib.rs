//! hari デバッガのコア機能
//!
//! このクレートは、デバッガの中核となる状態機械を提供します。
//! コマンドの解釈、単一ブレークポイントの管理、ステップ実行と継続実行の手順を扱います。

pub mod breakpoint;
pub mod command;
pub mod debugger;
pub mod errors;
pub mod parse;

#[cfg(test)]
mod testing;

pub use breakpoint::{Breakpoint, BreakpointManager};
pub use command::{Command, USAGE};
pub use debugger::{Debugger, Outcome, Termination};
pub use errors::DebugError;

// 他のクレートから使用するために再エクスポート
pub use hari_target::{Address, Process, Signal, StopStatus, Word};

/// デバッガの結果型
pub type Result<T> = std::result::Result<T, DebugError>;
