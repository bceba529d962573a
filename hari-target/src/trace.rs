//! トレース操作の抽象化
//!
//! デバッグループが必要とする操作（レジスタ・メモリの読み書き、実行再開と停止待機）を
//! トレイトとして切り出します。実プロセスでは [`crate::Process`] が実装します。

use crate::{Address, RegisterFile, Result, StopStatus, Word};

/// 実行再開のモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    /// 次の停止イベントまで実行する（PTRACE_CONT）
    Continue,
    /// 1命令だけ実行する（PTRACE_SINGLESTEP）
    SingleStep,
}

/// トレース対象
pub trait Tracee {
    /// レジスタセットの型
    type Registers: RegisterFile;

    /// レジスタを読み取る
    fn read_registers(&self) -> Result<Self::Registers>;

    /// レジスタに書き込む
    fn write_registers(&mut self, regs: Self::Registers) -> Result<()>;

    /// メモリから1ワード読み取る
    fn peek_word(&self, addr: Address) -> Result<Word>;

    /// メモリに1ワード書き込む
    fn poke_word(&mut self, addr: Address, word: Word) -> Result<()>;

    /// 実行を再開し、次の状態変化が報告されるまでブロックする
    fn resume(&mut self, mode: ResumeMode) -> Result<StopStatus>;

    /// ターゲットを強制終了する
    fn kill(&mut self) -> Result<()>;
}
