//! レジスタアクセス機能

use crate::{Result, TraceError};
use nix::unistd::Pid;

/// 命令ポインタを読み書きできるレジスタセット
pub trait RegisterFile: Clone {
    /// 命令ポインタを取得する
    fn instruction_pointer(&self) -> u64;

    /// 命令ポインタを設定する
    fn set_instruction_pointer(&mut self, ip: u64);
}

#[cfg(target_arch = "x86_64")]
impl RegisterFile for nix::libc::user_regs_struct {
    fn instruction_pointer(&self) -> u64 {
        self.rip
    }

    fn set_instruction_pointer(&mut self, ip: u64) {
        self.rip = ip;
    }
}

/// レジスタ情報
pub struct Registers {
    pid: Pid,
}

impl Registers {
    /// レジスタアクセスを作成する
    pub fn new(pid: Pid) -> Self {
        Self { pid }
    }

    /// レジスタを読み取る
    pub fn read(&self) -> Result<nix::libc::user_regs_struct> {
        nix::sys::ptrace::getregs(self.pid).map_err(TraceError::ptrace("PTRACE_GETREGS"))
    }

    /// レジスタに書き込む
    pub fn write(&self, regs: nix::libc::user_regs_struct) -> Result<()> {
        nix::sys::ptrace::setregs(self.pid, regs).map_err(TraceError::ptrace("PTRACE_SETREGS"))
    }
}
