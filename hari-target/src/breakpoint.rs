//! ソフトウェアブレークポイントの命令パッチ

use crate::Word;

/// INT3命令のオペコード
pub const TRAP_OPCODE: u8 = 0xCC;

/// トラップ命令が上書きするバイト数（命令ポインタの巻き戻し量）
pub const TRAP_OPCODE_LEN: u64 = 1;

/// ワードの最下位バイトをINT3命令で置き換える
///
/// ワードをリトルエンディアンのバイト列に分解し、先頭（最下位）バイトだけを
/// 置き換えて再構成します。残りのバイトはそのまま保持されます。
///
/// # Examples
/// ```
/// use hari_target::patch_trap;
///
/// assert_eq!(patch_trap(0xdeadbeef), 0xdeadbecc);
/// ```
pub fn patch_trap(word: Word) -> Word {
    let mut bytes = word.to_le_bytes();
    bytes[0] = TRAP_OPCODE;
    Word::from_le_bytes(bytes)
}
