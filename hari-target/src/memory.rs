//! メモリアクセス機能

use crate::{Address, Result, TraceError, Word};
use nix::sys::ptrace;
use nix::unistd::Pid;
use tracing::debug;

/// /proc/pid/maps の内容から最初のマッピングの開始アドレスを取り出す
///
/// フォーマット: "address perms offset dev inode pathname"
/// 例: "08048000-08049000 r-xp 00000000 08:01 123456 /tmp/target"
pub fn parse_first_mapping(maps: &str) -> Result<Address> {
    let line = maps
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| TraceError::MalformedMap(String::new()))?;
    let malformed = || TraceError::MalformedMap(line.to_string());

    let range = line.split_whitespace().next().ok_or_else(malformed)?;
    let (start, _) = range.split_once('-').ok_or_else(malformed)?;
    let start = u64::from_str_radix(start, 16).map_err(|_| malformed())?;
    Address::new(start).ok_or_else(malformed)
}

/// メモリアクセス
pub struct Memory {
    pid: Pid,
}

impl Memory {
    /// メモリアクセスを作成する
    pub fn new(pid: Pid) -> Self {
        Self { pid }
    }

    /// PTRACE_PEEKDATAで1ワード読み取る
    pub fn read_word(&self, addr: Address) -> Result<Word> {
        let word = ptrace::read(self.pid, addr.as_ptr()).map_err(|source| TraceError::Memory {
            op: "read",
            addr,
            source,
        })?;
        Ok(word as Word)
    }

    /// PTRACE_POKEDATAで1ワード書き込む
    pub fn write_word(&self, addr: Address, word: Word) -> Result<()> {
        ptrace::write(self.pid, addr.as_ptr(), word as nix::libc::c_long).map_err(|source| {
            TraceError::Memory {
                op: "write",
                addr,
                source,
            }
        })
    }

    /// 実行可能ファイルのベースアドレスを取得する
    ///
    /// /proc/pid/maps の最初のマッピングの開始アドレスを返します。
    /// ASLRを無効化して起動しているため、この値は実行ごとに変わりません。
    /// プロセスが停止している間に呼び出す必要があります。
    pub fn base_address(&self) -> Result<Address> {
        let maps_path = format!("/proc/{}/maps", self.pid);
        let maps = std::fs::read_to_string(&maps_path).map_err(|source| TraceError::Maps {
            path: maps_path.clone(),
            source,
        })?;
        let base = parse_first_mapping(&maps)?;
        debug!("Base address of {} is {}", self.pid, base);
        Ok(base)
    }
}
