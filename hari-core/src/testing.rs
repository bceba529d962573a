//! テスト用の疑似トレース対象
//!
//! 実プロセスの代わりに、あらかじめ決めたアドレス列を順に実行するターゲットを模倣します。
//! 最下位バイトがINT3のワードに到達するとSIGTRAPで停止し、命令ポインタはその次のバイトを指します。

use hari_target::{
    Address, RegisterFile, ResumeMode, Signal, StopStatus, TraceError, Tracee, Word, TRAP_OPCODE,
};
use nix::errno::Errno;
use std::collections::{HashMap, HashSet};

/// 命令ポインタだけを持つレジスタセット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRegisters {
    pub ip: u64,
}

impl RegisterFile for FakeRegisters {
    fn instruction_pointer(&self) -> u64 {
        self.ip
    }

    fn set_instruction_pointer(&mut self, ip: u64) {
        self.ip = ip;
    }
}

/// 疑似トレース対象
pub struct FakeTracee {
    memory: HashMap<u64, Word>,
    unreadable: HashSet<u64>,
    /// 実行されるアドレスの並び
    path: Vec<u64>,
    /// 次に実行するpathの位置
    pos: usize,
    ip: u64,
    exit_code: i32,
    /// このアドレスに到達したら指定の状態で止まる
    events: HashMap<u64, StopStatus>,
    alive: bool,
    /// 残りの成功するメモリ書き込み回数（Noneなら無制限）
    write_budget: Option<usize>,
    fail_register_writes: bool,
    /// 実行された（トラップに消費されなかった）命令のアドレス
    pub executed: Vec<u64>,
    /// トラップが発生したアドレス
    pub traps: Vec<u64>,
    /// トラップに消費されて実行されなかった命令のアドレス
    pub skipped: Vec<u64>,
    pub writes: Vec<(Address, Word)>,
    pub killed: bool,
    pub resumes: Vec<ResumeMode>,
}

/// 未書き込みのメモリはNOPで埋まっているものとする
const FILL: Word = 0x9090_9090_9090_9090;

impl FakeTracee {
    /// 何も実行しないターゲットを作成する（最初のresumeで終了する）
    pub fn new(base: u64) -> Self {
        Self::with_path(base, Vec::new())
    }

    /// 指定したアドレス列を順に実行するターゲットを作成する
    pub fn with_path(base: u64, path: Vec<u64>) -> Self {
        let ip = path.first().copied().unwrap_or(base);
        Self {
            memory: HashMap::new(),
            unreadable: HashSet::new(),
            path,
            pos: 0,
            ip,
            exit_code: 0,
            events: HashMap::new(),
            alive: true,
            write_budget: None,
            fail_register_writes: false,
            executed: Vec::new(),
            traps: Vec::new(),
            skipped: Vec::new(),
            writes: Vec::new(),
            killed: false,
            resumes: Vec::new(),
        }
    }

    pub fn store(&mut self, addr: Address, word: Word) {
        self.memory.insert(addr.value(), word);
    }

    pub fn load(&self, addr: Address) -> Word {
        self.load_raw(addr.value())
    }

    pub fn fail_reads_at(&mut self, addr: Address) {
        self.unreadable.insert(addr.value());
    }

    /// n回書き込みに成功した後、以降のメモリ書き込みを失敗させる
    pub fn fail_writes_after(&mut self, n: usize) {
        self.write_budget = Some(n);
    }

    pub fn fail_register_writes(&mut self) {
        self.fail_register_writes = true;
    }

    pub fn stop_at(&mut self, addr: u64, status: StopStatus) {
        self.events.insert(addr, status);
    }

    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = code;
    }

    pub fn ip(&self) -> u64 {
        self.ip
    }

    fn finish(&mut self, status: StopStatus) -> StopStatus {
        if !status.is_alive() {
            self.alive = false;
        }
        status
    }

    /// 1命令ぶん進める
    fn execute_one(&mut self) -> Tick {
        let Some(&current) = self.path.get(self.pos) else {
            return Tick::Stop(self.finish(StopStatus::Exited(self.exit_code)));
        };

        if self.ip == current + 1 && self.traps.last() == Some(&current) {
            // トラップで消費された命令を巻き戻さずに再開した
            self.skipped.push(current);
            self.pos += 1;
            self.ip = self.path.get(self.pos).copied().unwrap_or(0);
            return Tick::Skipped;
        }
        if self.ip != current {
            return Tick::Stop(self.finish(StopStatus::Stopped(Signal::SIGSEGV as i32)));
        }

        if let Some(status) = self.events.remove(&current) {
            return Tick::Stop(self.finish(status));
        }

        if self.load_raw(current) as u8 == TRAP_OPCODE {
            self.ip = current + 1;
            self.traps.push(current);
            return Tick::Stop(StopStatus::Stopped(Signal::SIGTRAP as i32));
        }

        self.executed.push(current);
        self.pos += 1;
        match self.path.get(self.pos) {
            Some(&next) => {
                self.ip = next;
                Tick::Executed
            }
            None => Tick::Stop(self.finish(StopStatus::Exited(self.exit_code))),
        }
    }

    fn load_raw(&self, addr: u64) -> Word {
        self.memory.get(&addr).copied().unwrap_or(FILL)
    }
}

enum Tick {
    Executed,
    Skipped,
    Stop(StopStatus),
}

impl Tracee for FakeTracee {
    type Registers = FakeRegisters;

    fn read_registers(&self) -> hari_target::Result<FakeRegisters> {
        Ok(FakeRegisters { ip: self.ip })
    }

    fn write_registers(&mut self, regs: FakeRegisters) -> hari_target::Result<()> {
        if self.fail_register_writes {
            return Err(TraceError::Ptrace {
                op: "PTRACE_SETREGS",
                source: Errno::EIO,
            });
        }
        self.ip = regs.ip;
        Ok(())
    }

    fn peek_word(&self, addr: Address) -> hari_target::Result<Word> {
        if self.unreadable.contains(&addr.value()) {
            return Err(TraceError::Memory {
                op: "read",
                addr,
                source: Errno::EIO,
            });
        }
        Ok(self.load(addr))
    }

    fn poke_word(&mut self, addr: Address, word: Word) -> hari_target::Result<()> {
        match self.write_budget.as_mut() {
            Some(0) => {
                return Err(TraceError::Memory {
                    op: "write",
                    addr,
                    source: Errno::EIO,
                })
            }
            Some(left) => *left -= 1,
            None => {}
        }
        self.writes.push((addr, word));
        self.store(addr, word);
        Ok(())
    }

    fn resume(&mut self, mode: ResumeMode) -> hari_target::Result<StopStatus> {
        if !self.alive {
            return Err(TraceError::Ptrace {
                op: "resume",
                source: Errno::ESRCH,
            });
        }
        self.resumes.push(mode);

        match mode {
            ResumeMode::SingleStep => loop {
                match self.execute_one() {
                    Tick::Executed => return Ok(StopStatus::Stopped(Signal::SIGTRAP as i32)),
                    Tick::Skipped => continue,
                    Tick::Stop(status) => return Ok(status),
                }
            },
            ResumeMode::Continue => loop {
                if let Tick::Stop(status) = self.execute_one() {
                    return Ok(status);
                }
            },
        }
    }

    fn kill(&mut self) -> hari_target::Result<()> {
        self.killed = true;
        self.alive = false;
        Ok(())
    }
}
