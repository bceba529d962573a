//! ターゲットのアドレスとワード

use std::fmt;

/// ターゲットメモリの1ワード（x86_64では8バイト）
pub type Word = u64;

/// ターゲットプロセス内のアドレス
///
/// 0は無効なアドレスとして扱い、構築時に弾きます。
/// 生のポインタ演算は行わず、必ず `from_offset` などのチェック付き演算を通します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address {
    /// 生の値からアドレスを作成する（0の場合はNone）
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// ベースアドレスにオフセットを加えたアドレスを作成する
    ///
    /// オーバーフローした場合や結果が0になる場合はNoneを返します。
    ///
    /// # Examples
    /// ```
    /// use hari_target::Address;
    ///
    /// let base = Address::new(0x0804_8000).unwrap();
    /// assert_eq!(Address::from_offset(base, 0x10).unwrap().value(), 0x0804_8010);
    /// assert!(Address::from_offset(base, -0x0804_8000).is_none());
    /// ```
    pub fn from_offset(base: Address, offset: i64) -> Option<Self> {
        base.0.checked_add_signed(offset).and_then(Self::new)
    }

    /// アドレスの値を取得する
    pub fn value(self) -> u64 {
        self.0
    }

    /// ptraceに渡す形式に変換する
    pub(crate) fn as_ptr(self) -> nix::sys::ptrace::AddressType {
        self.0 as nix::sys::ptrace::AddressType
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
