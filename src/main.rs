//! tash — 小さな対話型コマンドインタプリタ
//!
//! REPLループ: プロンプト表示 → 1 行読み取り → トークナイズ → ディスパッチ → ループ
//!
//! `exit` ビルトインが [`Flow::Stop`] を返すとループを抜けて正常終了する。
//! 入力終端（Ctrl+D）では行リーダがその場でプロセスを終了する。

use std::io::{self, Write};

use log::debug;

use tash::executor;
use tash::parser;
use tash::reader::LineReader;
use tash::shell::{Flow, Shell};

const PROMPT_COLOR: &str = "\x1b[0;35mtash\x1b[0;31m> \x1b[0;36m";
const PROMPT_PLAIN: &str = "tash> ";
const RESET: &str = "\x1b[0m";

fn main() {
    // ログは既定で無効。TASH_LOG=debug などで stderr に出す
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("TASH_LOG", "off")).init();

    let mut shell = match Shell::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("tash: {}", e);
            std::process::exit(1);
        }
    };
    debug!("starting in {}", shell.cwd.display());

    // 端末のときだけ色付きプロンプトを出す
    let color = unsafe { libc::isatty(libc::STDOUT_FILENO) } == 1;
    let stdin = io::stdin();
    let mut reader = LineReader::new(stdin.lock());
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    loop {
        let _ = stdout.write_all(if color { PROMPT_COLOR } else { PROMPT_PLAIN }.as_bytes());
        let _ = stdout.flush();

        let line = reader.read_line();
        if color {
            let _ = stdout.write_all(RESET.as_bytes());
        }

        let args = parser::tokenize(&line);
        let flow = executor::execute(&mut shell, &args, &mut stdout, &mut stderr);
        let _ = stdout.flush();

        if flow == Flow::Stop {
            break;
        }
    }
}
