//! デバッガのメインロジック
//!
//! オペレータのコマンドを受け取り、ターゲットの停止状態に応じて
//! ステップ実行・継続実行・ブレークポイントの有効化/解除を行う状態機械です。

use crate::breakpoint::{Breakpoint, BreakpointManager};
use crate::parse::parse_offset;
use crate::{Command, DebugError, Result};
use hari_target::{
    Address, RegisterFile, ResumeMode, Signal, StopStatus, Tracee, Word, TRAP_OPCODE_LEN,
};
use tracing::{debug, info, warn};

/// コマンド実行の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// ブレークポイントを設定した
    BreakpointSet(Address),
    /// ブレークポイントを解除した
    BreakpointCleared,
    /// 1命令実行した
    Stepped,
    /// 継続実行してトラップで停止した（ブレークポイントで止まった場合はそのアドレス）
    Continued { trapped_at: Option<Address> },
    /// メモリの1ワード
    Word { address: Address, word: Word },
    /// オフセットが不正、またはアドレスにアクセスできない
    InvalidAddress,
    /// 認識できないコマンド
    Usage,
    /// セッション終了。`Debugger::finish` で結果を取得する
    Ended,
}

/// セッション終了時のターゲットの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// 正常終了した
    Exited(i32),
    /// シグナルで終了した
    Signaled(i32),
    /// 停止中のターゲットを強制終了した（SIGTRAP以外で停止していた場合はそのシグナル番号）
    Killed(Option<i32>),
}

/// デバッガ
pub struct Debugger<T: Tracee> {
    /// デバッグ対象
    tracee: T,
    /// オフセットの基準になるベースアドレス
    base: Address,
    /// ブレークポイント管理
    breakpoints: BreakpointManager,
    /// 直近の停止状態
    status: StopStatus,
    /// オペレータが終了を要求した
    quit: bool,
}

impl<T: Tracee> Debugger<T> {
    /// 起動直後のトラップで停止しているターゲットからデバッガを作成する
    pub fn new(tracee: T, base: Address) -> Self {
        Self {
            tracee,
            base,
            breakpoints: BreakpointManager::new(),
            status: StopStatus::Stopped(Signal::SIGTRAP as i32),
            quit: false,
        }
    }

    /// ベースアドレスを取得する
    pub fn base(&self) -> Address {
        self.base
    }

    /// 直近の停止状態を取得する
    pub fn status(&self) -> StopStatus {
        self.status
    }

    /// 現在のブレークポイントを取得する
    pub fn breakpoint(&self) -> Option<&Breakpoint> {
        self.breakpoints.current()
    }

    /// デバッグ対象を取得する
    pub fn tracee(&self) -> &T {
        &self.tracee
    }

    /// コマンドを受け付けられる状態か
    pub fn is_interactive(&self) -> bool {
        !self.quit && self.status.is_trapped()
    }

    /// オフセットをベースアドレスからの絶対アドレスに変換する
    pub fn resolve(&self, offset: &str) -> Result<Address> {
        let offset = parse_offset(offset)?;
        Address::from_offset(self.base, offset).ok_or(DebugError::AddressOutOfRange {
            base: self.base,
            offset,
        })
    }

    /// コマンドを実行する
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        if !self.is_interactive() {
            return Err(DebugError::NotInteractive);
        }

        match command {
            Command::Break { offset, persistent } => Ok(self.set_breakpoint(&offset, persistent)),
            Command::ClearBreak => {
                self.breakpoints.clear();
                Ok(Outcome::BreakpointCleared)
            }
            Command::Step => self.step(),
            Command::Continue => self.continue_execution(),
            Command::Print { offset } => Ok(self.print_word(&offset)),
            Command::Quit => {
                info!("Session ended by operator");
                self.quit = true;
                Ok(Outcome::Ended)
            }
            Command::Unknown(input) => {
                debug!("Unknown command: {:?}", input);
                Ok(Outcome::Usage)
            }
        }
    }

    fn set_breakpoint(&mut self, offset: &str, persistent: bool) -> Outcome {
        match self.resolve(offset) {
            Ok(address) => {
                self.breakpoints.set(address, persistent);
                Outcome::BreakpointSet(address)
            }
            Err(err) => {
                debug!("Rejected breakpoint: {}", err);
                Outcome::InvalidAddress
            }
        }
    }

    fn print_word(&self, offset: &str) -> Outcome {
        let address = match self.resolve(offset) {
            Ok(address) => address,
            Err(err) => {
                debug!("Rejected print: {}", err);
                return Outcome::InvalidAddress;
            }
        };

        match self.tracee.peek_word(address) {
            Ok(word) => Outcome::Word { address, word },
            Err(err) => {
                warn!("{}", err);
                Outcome::InvalidAddress
            }
        }
    }

    /// 実行を再開し、停止状態を記録する。トラップ以外ならセッション終了
    fn resume(&mut self, mode: ResumeMode) -> Result<bool> {
        self.status = self.tracee.resume(mode)?;
        if !self.status.is_trapped() {
            info!("Target left the trapped state: {:?}", self.status);
            return Ok(false);
        }
        Ok(true)
    }

    /// 1命令だけ実行する
    fn step(&mut self) -> Result<Outcome> {
        if self.resume(ResumeMode::SingleStep)? {
            Ok(Outcome::Stepped)
        } else {
            Ok(Outcome::Ended)
        }
    }

    /// 次のブレークポイントか終了まで実行する
    ///
    /// 現在の命令の位置にブレークポイントがある場合にすぐ再トラップしないよう、
    /// まず1命令進めてからブレークポイントを有効化します。
    /// トラップ後は元の命令を書き戻し、消費された命令を再実行できるよう命令ポインタを巻き戻します。
    fn continue_execution(&mut self) -> Result<Outcome> {
        if !self.resume(ResumeMode::SingleStep)? {
            return Ok(Outcome::Ended);
        }

        let armed = match self.breakpoints.arm(&mut self.tracee) {
            Ok(armed) => armed,
            Err(DebugError::Trace(err)) => {
                // 有効化できないブレークポイントは捨てて、オペレータに制御を戻す
                warn!("Dropping breakpoint: {}", err);
                self.breakpoints.clear();
                return Ok(Outcome::InvalidAddress);
            }
            Err(err) => return Err(err),
        };

        if !self.resume(ResumeMode::Continue)? {
            // トラップ同期を失ったので、ブレークポイントは戻さずに終了する
            return Ok(Outcome::Ended);
        }

        let Some(address) = armed else {
            return Ok(Outcome::Continued { trapped_at: None });
        };

        self.breakpoints.disarm(&mut self.tracee)?;

        let mut regs = self.tracee.read_registers()?;
        let ip = regs.instruction_pointer();
        if ip != address.value() + TRAP_OPCODE_LEN {
            warn!("Trapped at {:#x}, not at breakpoint {}", ip, address);
        }
        regs.set_instruction_pointer(ip.wrapping_sub(TRAP_OPCODE_LEN));
        self.tracee.write_registers(regs)?;

        debug!("Stopped at breakpoint {}", address);
        Ok(Outcome::Continued {
            trapped_at: Some(address),
        })
    }

    /// セッションを終了し、ターゲットの最終状態を返す
    ///
    /// ターゲットが停止したまま残っている場合は強制終了します。
    pub fn finish(mut self) -> Result<Termination> {
        let termination = match self.status {
            StopStatus::Stopped(signal) => {
                self.tracee.kill()?;
                Termination::Killed((signal != Signal::SIGTRAP as i32).then_some(signal))
            }
            StopStatus::Exited(code) => Termination::Exited(code),
            StopStatus::Signaled(signal) => Termination::Signaled(signal),
        };
        info!("Session finished: {:?}", termination);
        Ok(termination)
    }
}
