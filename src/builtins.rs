//! ビルトインコマンドの実装。
//!
//! ビルトインは fork/exec を経由せずプロセス内で直接実行される。
//! 名前とハンドラは 1 つの順序付きテーブル [`BUILTINS`] にまとめており、
//! テーブルの順序がそのまま `help` の一覧順になる。

use std::ffi::{CString, OsStr};
use std::fs;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::debug;

use crate::shell::{Flow, Shell};

/// ビルトインのハンドラ。引数列全体（`args[0]` はコマンド名）と出力先を受け取る。
/// 引数はトークナイザが返したバイト列のまま。
pub type Handler = fn(&mut Shell, &[&[u8]], &mut dyn Write, &mut dyn Write) -> Flow;

/// ビルトインテーブルの 1 エントリ。
pub struct Builtin {
    pub name: &'static str,
    pub handler: Handler,
}

/// 登録済みビルトイン。名前は一意。
pub static BUILTINS: [Builtin; 3] = [
    Builtin { name: "cd", handler: builtin_cd },
    Builtin { name: "help", handler: builtin_help },
    Builtin { name: "exit", handler: builtin_exit },
];

/// 名前でビルトインを検索する。テーブルを先頭から走査し、最初に完全一致したものを返す。
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// `cd dir` — 作業ディレクトリを変更する。引数省略はエラー。
fn builtin_cd(
    shell: &mut Shell,
    args: &[&[u8]],
    _out: &mut dyn Write,
    err: &mut dyn Write,
) -> Flow {
    let Some(&dir) = args.get(1) else {
        let _ = writeln!(err, "tash: expected argument to \"cd\"");
        return Flow::Continue;
    };

    let dir = Path::new(OsStr::from_bytes(dir));
    let result = resolve_dir(&shell.cwd, dir).and_then(|path| {
        debug!("cd: {} -> {}", shell.cwd.display(), path.display());
        shell.set_cwd(path)
    });
    if let Err(e) = result {
        let _ = writeln!(err, "tash: cd: {}: {}", dir.display(), e);
    }
    Flow::Continue
}

/// `cwd` を基準に `dir` を解決し、移動可能なディレクトリなら正規化済みの絶対パスを返す。
///
/// `chdir(2)` と同じ条件で失敗する: 存在しない（`ENOENT`）、ディレクトリでない（`ENOTDIR`）、
/// 検索権限がない（`EACCES`）。
fn resolve_dir(cwd: &Path, dir: &Path) -> io::Result<PathBuf> {
    let resolved = fs::canonicalize(cwd.join(dir))?;
    if !fs::metadata(&resolved)?.is_dir() {
        return Err(io::Error::from_raw_os_error(libc::ENOTDIR));
    }
    let c_path = CString::new(resolved.as_os_str().as_bytes())
        .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    if unsafe { libc::access(c_path.as_ptr(), libc::X_OK) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(resolved)
}

/// `help` — バナーとビルトイン一覧を表示する。引数は見ない。
fn builtin_help(
    _shell: &mut Shell,
    _args: &[&[u8]],
    out: &mut dyn Write,
    _err: &mut dyn Write,
) -> Flow {
    let _ = writeln!(out, "The Amazing SHell:TASH!");
    let _ = writeln!(out, "Type program names and arguments, and hit enter.");
    let _ = writeln!(out, "The following are built in:");
    for b in BUILTINS.iter() {
        let _ = writeln!(out, "  {}", b.name);
    }
    let _ = writeln!(out, "Use the man command for information on other programs.");
    Flow::Continue
}

/// `exit` — メインループを終了させる。引数は無視し、終了コードは常に成功。
fn builtin_exit(
    _shell: &mut Shell,
    _args: &[&[u8]],
    _out: &mut dyn Write,
    _err: &mut dyn Write,
) -> Flow {
    Flow::Stop
}
