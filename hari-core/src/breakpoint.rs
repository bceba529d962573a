//! ブレークポイント管理

use crate::{DebugError, Result};
use hari_target::{patch_trap, Address, Tracee, Word};
use tracing::debug;

/// ブレークポイント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub address: Address,
    /// trueなら解除後も残る（`bs`）、falseなら1回で消える（`b`）
    pub persistent: bool,
    /// 有効化中に保存している元のワード
    original: Option<Word>,
}

impl Breakpoint {
    /// 有効化されている（トラップ命令が書き込まれている）か
    pub fn is_armed(&self) -> bool {
        self.original.is_some()
    }

    /// 有効化中なら、トラップ命令で上書きする前のワード
    pub fn original(&self) -> Option<Word> {
        self.original
    }
}

/// ブレークポイントマネージャ
///
/// 同時に存在できるブレークポイントは1つだけです。
/// トラップ命令はcontinueの間だけ書き込み、制御がオペレータに戻る前に必ず元に戻します。
#[derive(Debug, Default)]
pub struct BreakpointManager {
    current: Option<Breakpoint>,
}

impl BreakpointManager {
    /// 新しいブレークポイントマネージャを作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// ブレークポイントを設定する
    ///
    /// 既存のブレークポイントは置き換えられます。ターゲットのメモリには触れません。
    pub fn set(&mut self, address: Address, persistent: bool) {
        debug!("Breakpoint set at {} (persistent: {})", address, persistent);
        self.current = Some(Breakpoint {
            address,
            persistent,
            original: None,
        });
    }

    /// ブレークポイントを破棄する
    ///
    /// 有効化中でもメモリは元に戻さないので、先に `disarm` を呼ぶこと。
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// 現在のブレークポイントを取得する
    pub fn current(&self) -> Option<&Breakpoint> {
        self.current.as_ref()
    }

    /// 現在のブレークポイントが有効化されているか
    pub fn is_armed(&self) -> bool {
        self.current.as_ref().is_some_and(Breakpoint::is_armed)
    }

    /// ブレークポイントを有効化する
    ///
    /// 元のワードを保存し、最下位バイトをINT3命令に置き換えたワードを書き込みます。
    /// ブレークポイントが設定されていなければ何もせずNoneを返します。
    pub fn arm<T: Tracee>(&mut self, tracee: &mut T) -> Result<Option<Address>> {
        let Some(bp) = self.current.as_mut() else {
            return Ok(None);
        };
        if bp.is_armed() {
            return Err(DebugError::AlreadyArmed(bp.address));
        }

        let original = tracee.peek_word(bp.address)?;
        tracee.poke_word(bp.address, patch_trap(original))?;
        bp.original = Some(original);

        debug!("Armed breakpoint at {} (original {:#x})", bp.address, original);
        Ok(Some(bp.address))
    }

    /// ブレークポイントを解除する
    ///
    /// 有効化時に保存したワードを書き戻します。1回限りのブレークポイントはここで破棄されます。
    pub fn disarm<T: Tracee>(&mut self, tracee: &mut T) -> Result<Address> {
        let bp = self.current.as_mut().ok_or(DebugError::NotArmed)?;
        let original = bp.original.take().ok_or(DebugError::NotArmed)?;
        let address = bp.address;

        if let Err(err) = tracee.poke_word(address, original) {
            // 書き戻しに失敗した場合は再試行できるよう元のワードを残しておく
            bp.original = Some(original);
            return Err(err.into());
        }

        if !bp.persistent {
            self.current = None;
        }

        debug!("Disarmed breakpoint at {}", address);
        Ok(address)
    }
}
