//! デバッガコマンド

/// デバッガコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// ブレークポイントを設定（`b` は1回限り、`bs` は保持）
    Break { offset: String, persistent: bool },
    /// ブレークポイントを解除
    ClearBreak,
    /// ステップ実行
    Step,
    /// 実行継続
    Continue,
    /// メモリの1ワードを表示
    Print { offset: String },
    /// 終了（空行の入力）
    Quit,
    /// 認識できないコマンド
    Unknown(String),
}

impl Command {
    /// 入力行をパースする
    ///
    /// 空白で区切られた単語列として解釈します。単語が1つもなければ `Quit` です。
    /// 引数の数が合わないコマンドは `Unknown` になります。
    pub fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let Some((&cmd, args)) = parts.split_first() else {
            return Command::Quit;
        };

        match (cmd, args) {
            ("b", [offset]) => Command::Break {
                offset: offset.to_string(),
                persistent: false,
            },
            ("bs", [offset]) => Command::Break {
                offset: offset.to_string(),
                persistent: true,
            },
            ("br", []) => Command::ClearBreak,
            ("s", []) => Command::Step,
            ("c", []) => Command::Continue,
            ("p", [offset]) => Command::Print {
                offset: offset.to_string(),
            },
            _ => Command::Unknown(input.trim().to_string()),
        }
    }
}

/// 使い方の表示
pub const USAGE: &str = "Unknown command. Available commands:
   b <address>    set one-time breakpoint
   bs <address>   set breakpoint
   br             clear breakpoint
   s              single step
   c              resume program
   p <address>    show memory content";
