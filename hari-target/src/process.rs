//! プロセス制御機能

use crate::trace::{ResumeMode, Tracee};
use crate::{Address, Memory, Registers, Result, TraceError, Word};
use nix::errno::Errno;
use nix::libc::{self, c_int};
use nix::sys::ptrace;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::ffi::CString;
use std::path::Path;
use tracing::{debug, info, warn};

/// 直近の待機で観測した停止状態
///
/// シグナルはリアルタイムシグナルも表せるよう生の番号で保持します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    /// シグナルで停止した（トレース下の停止）
    Stopped(i32),
    /// プロセス終了
    Exited(i32),
    /// シグナルで終了した
    Signaled(i32),
}

impl StopStatus {
    /// waitpidが返した生のステータスから停止状態を求める
    pub fn from_raw(status: c_int) -> Result<Self> {
        if libc::WIFEXITED(status) {
            Ok(Self::Exited(libc::WEXITSTATUS(status)))
        } else if libc::WIFSIGNALED(status) {
            Ok(Self::Signaled(libc::WTERMSIG(status)))
        } else if libc::WIFSTOPPED(status) {
            Ok(Self::Stopped(libc::WSTOPSIG(status)))
        } else {
            Err(TraceError::UnexpectedStatus(status))
        }
    }

    /// SIGTRAPで停止しているか（デバッガが制御を持っている状態か）
    pub fn is_trapped(&self) -> bool {
        *self == Self::Stopped(Signal::SIGTRAP as i32)
    }

    /// プロセスがまだ存在しているか
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }
}

/// 指定したプロセスの状態変化を待つ
///
/// nixの `WaitStatus` はリアルタイムシグナルを表せないため、生のステータスを使います。
fn wait_for(pid: Pid) -> Result<StopStatus> {
    let mut status: c_int = 0;
    let res = unsafe { libc::waitpid(pid.as_raw(), &mut status, 0) };
    Errno::result(res).map_err(TraceError::ptrace("waitpid"))?;
    StopStatus::from_raw(status)
}

/// デバッグ対象のプロセス
pub struct Process {
    pid: Pid,
    memory: Memory,
    registers: Registers,
    alive: bool,
}

impl Process {
    /// 実行可能ファイルを起動してデバッグ対象プロセスを開始する
    ///
    /// 新しいプロセスをforkし、子プロセス側でPTRACE_TRACEMEとASLRの無効化を行ってから
    /// 空の環境変数で実行可能ファイルをexecveします。
    /// execve直後のSIGTRAPで停止した状態のプロセスを返します。
    pub fn spawn<P: AsRef<Path>>(program: P, args: &[String]) -> Result<Self> {
        use nix::unistd::{fork, ForkResult};

        let program_path = program.as_ref().to_string_lossy().into_owned();
        let program_cstring = CString::new(program_path.as_str())?;

        // argv[0]はプログラムパス
        let mut cstring_args = vec![program_cstring.clone()];
        for arg in args {
            cstring_args.push(CString::new(arg.as_str())?);
        }

        // 子プロセスで報告するエラーメッセージはfork前に組み立てておく
        let load_error = format!("Couldn't load {}\n", program_path);

        match unsafe { fork() }.map_err(TraceError::Fork)? {
            ForkResult::Parent { child } => {
                let status = wait_for(child)?;
                match status {
                    status if status.is_trapped() => {
                        info!("Spawned {} as pid {}", program_path, child);
                        Ok(Self {
                            pid: child,
                            memory: Memory::new(child),
                            registers: Registers::new(child),
                            alive: true,
                        })
                    }
                    status => {
                        if status.is_alive() {
                            let _ = signal::kill(child, Signal::SIGKILL);
                            let _ = wait_for(child);
                        }
                        Err(TraceError::NotTrapped(status))
                    }
                }
            }
            ForkResult::Child => {
                // ここから先は子プロセス。失敗しても親のコードへは戻らない
                let _ = Self::exec_traced(&program_cstring, &cstring_args);
                let _ = nix::unistd::write(std::io::stderr(), load_error.as_bytes());
                unsafe { nix::libc::_exit(1) }
            }
        }
    }

    /// 子プロセス側の準備とexecve（成功すると戻ってこない）
    fn exec_traced(program: &CString, args: &[CString]) -> nix::Result<()> {
        use nix::sys::personality::{self, Persona};
        use nix::unistd::execve;

        ptrace::traceme()?;
        personality::set(personality::get()? | Persona::ADDR_NO_RANDOMIZE)?;

        let env: [CString; 0] = [];
        execve(program, args, &env)?;
        Ok(())
    }

    /// プロセスIDを取得する
    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }

    /// 実行可能ファイルのベースアドレスを取得する
    pub fn base_address(&self) -> Result<Address> {
        self.memory.base_address()
    }

    /// 停止イベントを待機する
    fn wait(&mut self) -> Result<StopStatus> {
        let status = wait_for(self.pid)?;
        if !status.is_alive() {
            self.alive = false;
        }
        debug!("Process {} changed state: {:?}", self.pid, status);
        Ok(status)
    }
}

impl Tracee for Process {
    type Registers = nix::libc::user_regs_struct;

    fn read_registers(&self) -> Result<Self::Registers> {
        self.registers.read()
    }

    fn write_registers(&mut self, regs: Self::Registers) -> Result<()> {
        self.registers.write(regs)
    }

    fn peek_word(&self, addr: Address) -> Result<Word> {
        self.memory.read_word(addr)
    }

    fn poke_word(&mut self, addr: Address, word: Word) -> Result<()> {
        self.memory.write_word(addr, word)
    }

    fn resume(&mut self, mode: ResumeMode) -> Result<StopStatus> {
        match mode {
            ResumeMode::Continue => {
                ptrace::cont(self.pid, None).map_err(TraceError::ptrace("PTRACE_CONT"))?
            }
            ResumeMode::SingleStep => {
                ptrace::step(self.pid, None).map_err(TraceError::ptrace("PTRACE_SINGLESTEP"))?
            }
        }
        self.wait()
    }

    fn kill(&mut self) -> Result<()> {
        signal::kill(self.pid, Signal::SIGKILL).map_err(TraceError::ptrace("kill"))?;
        self.alive = false;
        // ゾンビを残さないよう回収する
        wait_for(self.pid)?;
        info!("Killed process {}", self.pid);
        Ok(())
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if self.alive {
            warn!("Process {} still alive on drop, killing it", self.pid);
            let _ = signal::kill(self.pid, Signal::SIGKILL);
            let _ = wait_for(self.pid);
        }
    }
}
