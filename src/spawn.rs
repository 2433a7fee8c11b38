//! 外部コマンドの起動: `fork()` + `execvp()` と、終了までの待機。
//!
//! ## 構成
//!
//! | 項目 | 役割 |
//! |------|------|
//! | [`CStringVec`] | argv 用の NULL 終端ポインタ配列 |
//! | [`spawn`] | fork し、子で `fchdir` + `execvp` する。親には子 PID を返す |
//! | [`wait_terminal`] | `waitpid(WUNTRACED)` を正常終了またはシグナル終了までループ |
//! | [`launch`] | 上記を組み合わせたディスパッチ用の入口 |
//!
//! 子プロセスで必要なもの（argv、作業ディレクトリの fd、エラーメッセージの接頭辞）はすべて
//! fork 前に用意する。fork 後の子はヒープを確保しない。エラー出力は Rust の stderr ロックを
//! 経由せず `write(2)` と `strerror(3)` で行う。

use std::ffi::CString;
use std::fmt;
use std::io::{self, Write};

use libc::pid_t;
use log::{debug, trace};

use crate::shell::{Flow, Shell};

// ── エラー型 ──────────────────────────────────────────────────────

/// 親プロセス側で起きる起動失敗。exec の失敗は子プロセス側で報告されるためここには含まない。
#[derive(Debug)]
pub enum SpawnError {
    /// 引数列が空。
    Empty,
    /// `fork()` が失敗した。
    Fork(io::Error),
    /// 引数に NUL バイトが含まれ、C 文字列に変換できない。
    Nul { command: String },
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "tash: empty command"),
            Self::Fork(e) => write!(f, "tash: fork: {}", e),
            Self::Nul { command } => write!(f, "tash: {}: argument contains a NUL byte", command),
        }
    }
}

/// exec 失敗時の子プロセスの終了ステータス。
/// 127 = command not found, 126 = permission denied, 1 = その他。
pub fn exec_failure_status(errno: i32) -> i32 {
    match errno {
        libc::ENOENT => 127,
        libc::EACCES => 126,
        _ => 1,
    }
}

// ── CStringVec ────────────────────────────────────────────────────

/// argv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
struct CStringVec {
    _strings: Vec<CString>,
    ptrs: Vec<*const libc::c_char>,
}

impl CStringVec {
    /// 引数リストから構築する。NUL バイトを含む引数があれば `None`。
    fn from_args(args: &[&[u8]]) -> Option<Self> {
        let strings = args
            .iter()
            .map(|s| CString::new(*s).ok())
            .collect::<Option<Vec<CString>>>()?;
        let mut ptrs: Vec<*const libc::c_char> = strings.iter().map(|s| s.as_ptr()).collect();
        ptrs.push(std::ptr::null()); // NULL 終端
        Some(Self {
            _strings: strings,
            ptrs,
        })
    }

    /// 実行するプログラム名（`argv[0]`）。
    fn program(&self) -> *const libc::c_char {
        self.ptrs[0]
    }

    fn as_ptr(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }
}

// ── 起動 ──────────────────────────────────────────────────────────

/// 子プロセスの終了状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// 正常終了。引数は終了コード。
    Exited(i32),
    /// シグナルで終了。引数はシグナル番号。
    Signaled(i32),
}

/// fork して子プロセスで `args[0]` を実行する。成功時は子 PID を返す。
///
/// 子は [`Shell`] が保持するディレクトリ fd に `fchdir` してから `execvp` する
/// （`/` を含まない名前は `$PATH` 検索）。fd を使うため、作業ディレクトリが削除された後でも起動できる。
/// `fchdir` や `execvp` が失敗した場合、子は stderr に `tash: <name>: <error>` を書いて `_exit` し、
/// 親のループには戻らない。
pub fn spawn(shell: &Shell, args: &[&[u8]]) -> Result<pid_t, SpawnError> {
    let Some(&name) = args.first() else {
        return Err(SpawnError::Empty);
    };
    let argv = CStringVec::from_args(args).ok_or_else(|| SpawnError::Nul {
        command: String::from_utf8_lossy(name).into_owned(),
    })?;
    let cwd_fd = shell.cwd_fd();

    let mut exec_prefix = b"tash: ".to_vec();
    exec_prefix.extend_from_slice(name);
    exec_prefix.extend_from_slice(b": ");

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(SpawnError::Fork(io::Error::last_os_error()));
    }

    if pid == 0 {
        // 子プロセス
        unsafe {
            if libc::fchdir(cwd_fd) != 0 {
                exit_child(b"tash: fchdir: ");
            }
            libc::execvp(argv.program(), argv.as_ptr());
        }
        // execvp が戻るのは失敗時のみ
        exit_child(&exec_prefix);
    }

    Ok(pid)
}

/// 子プロセス側: `prefix` と直前の errno の説明を stderr に書いて即座に終了する。
///
/// fork 後に呼ばれるため、ヒープ確保もロックの取得もしない。
fn exit_child(prefix: &[u8]) -> ! {
    let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
    unsafe {
        write_stderr(prefix);
        let desc = libc::strerror(errno);
        libc::write(libc::STDERR_FILENO, desc as *const libc::c_void, libc::strlen(desc));
        write_stderr(b"\n");
        libc::_exit(exec_failure_status(errno))
    }
}

unsafe fn write_stderr(bytes: &[u8]) {
    libc::write(
        libc::STDERR_FILENO,
        bytes.as_ptr() as *const libc::c_void,
        bytes.len(),
    );
}

// ── 待機 ──────────────────────────────────────────────────────────

/// 子プロセスが終了するまでブロックする。
///
/// `waitpid(pid, WUNTRACED)` をループし、`WIFEXITED` または `WIFSIGNALED` になったら返る。
/// ジョブ制御はないため、停止（`WIFSTOPPED`）は終了とみなさず待ち続ける。
/// `EINTR` は再試行する。
pub fn wait_terminal(pid: pid_t) -> io::Result<ChildExit> {
    loop {
        let mut raw_status: i32 = 0;
        let ret = unsafe { libc::waitpid(pid, &mut raw_status, libc::WUNTRACED) };

        if ret < 0 {
            let e = io::Error::last_os_error();
            if e.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(e);
        }

        if libc::WIFEXITED(raw_status) {
            return Ok(ChildExit::Exited(libc::WEXITSTATUS(raw_status)));
        }
        if libc::WIFSIGNALED(raw_status) {
            return Ok(ChildExit::Signaled(libc::WTERMSIG(raw_status)));
        }
        trace!("pid {} stopped, still waiting", pid);
    }
}

/// 外部コマンドを起動して終了まで待つ。
///
/// 常に [`Flow::Continue`] を返す。子の終了コードはループの継続判定に影響しない。
/// 空の引数列では何もしない。
pub fn launch(shell: &Shell, args: &[&[u8]], err: &mut dyn Write) -> Flow {
    match spawn(shell, args) {
        Ok(pid) => {
            debug!("spawned {} as pid {}", String::from_utf8_lossy(args[0]), pid);
            match wait_terminal(pid) {
                Ok(exit) => debug!("pid {} finished: {:?}", pid, exit),
                Err(e) => {
                    let _ = writeln!(err, "tash: wait: {}", e);
                }
            }
        }
        Err(SpawnError::Empty) => {}
        Err(e) => {
            let _ = writeln!(err, "{}", e);
        }
    }
    Flow::Continue
}
