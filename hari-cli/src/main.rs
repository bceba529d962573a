//! hari CLI - コマンドラインインターフェース
//!
//! 単一ブレークポイントのデバッガ hari のREPLインターフェース

use anyhow::{Context, Result};
use clap::Parser;
use hari_core::{Command, Debugger, Outcome, Process, Termination, USAGE};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// hari - minimal single-breakpoint debugger
#[derive(Parser)]
#[command(name = "hari")]
#[command(version = "0.1.0")]
#[command(about = "Run a program under ptrace with one breakpoint at a time", long_about = None)]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "hari_core=trace"
    #[arg(long)]
    log_level: Option<String>,

    /// Path to the executable binary
    target: String,

    /// Arguments to pass to the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let mut debugger = init_debugger(&cli.target, &cli.args)?;
    run_repl(&mut debugger)?;

    let termination = debugger.finish()?;
    if let Some(report) = render_termination(&termination) {
        println!("{}", report);
    }

    Ok(())
}

/// ログ出力を初期化する（標準出力はオペレータ用なので標準エラーに出す）
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// ターゲットを起動してデバッガを初期化する
fn init_debugger(target: &str, args: &[String]) -> Result<Debugger<Process>> {
    let process = Process::spawn(target, args).context("Couldn't start debugging the target")?;
    let base = process
        .base_address()
        .context("Couldn't determine the target's base address")?;
    debug!("Target pid {} loaded at {}", process.pid(), base);

    Ok(Debugger::new(process, base))
}

/// REPLループを実行する
///
/// ターゲットがトラップで停止している間だけコマンドを受け付けます。
fn run_repl(debugger: &mut Debugger<Process>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    while debugger.is_interactive() {
        let line = match rl.readline(">") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    rl.add_history_entry(line.as_str())?;
                }
                line
            }
            // 入力の終わりは空行と同じくセッション終了として扱う
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => String::new(),
            Err(err) => return Err(err.into()),
        };

        match debugger.execute(Command::parse(&line)) {
            Ok(Outcome::Ended) => break,
            Ok(outcome) => {
                if let Some(text) = render_outcome(&outcome) {
                    println!("{}", text);
                }
            }
            Err(err) => {
                error!("{}", err);
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    Ok(())
}

/// コマンド結果の表示文字列
fn render_outcome(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Word { word, .. } => Some(format!("0x{:08x}", word)),
        Outcome::InvalidAddress => Some("Invalid address".to_string()),
        Outcome::Usage => Some(USAGE.to_string()),
        Outcome::BreakpointSet(_)
        | Outcome::BreakpointCleared
        | Outcome::Stepped
        | Outcome::Continued { .. }
        | Outcome::Ended => None,
    }
}

/// 終了理由の表示文字列
fn render_termination(termination: &Termination) -> Option<String> {
    match termination {
        Termination::Exited(_) => Some("Target exited".to_string()),
        Termination::Signaled(signal) => {
            Some(format!("Target terminated by signal number {}", signal))
        }
        Termination::Killed(Some(signal)) => Some(format!(
            "Target stopped by signal number {}. Terminating ...",
            signal
        )),
        Termination::Killed(None) => None,
    }
}
