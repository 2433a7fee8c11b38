//! シェルの実行状態と、ループ制御に使う型。
//!
//! カレントディレクトリはプロセスの `chdir` ではなく [`Shell`] に明示的に保持する。
//! パス（[`Shell::cwd`]）とそのディレクトリを開いた fd の組で、`cd` ビルトインが書き換え、
//! [`spawn`](crate::spawn) が子プロセス側で `fchdir` してから exec する。
//! fd を保持しているため、移動後にディレクトリが削除されても子プロセスは起動できる。

use std::env;
use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

/// 1 回のディスパッチの結果。メインループが次のプロンプトを出すかどうかを決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// 次の行を読む。
    Continue,
    /// ループを終了する（`exit` ビルトインのみが返す）。
    Stop,
}

/// シェルの実行状態。メインループ全体で共有される。
#[derive(Debug)]
pub struct Shell {
    /// 外部コマンドの起動と `cd` の相対パス解決に使う作業ディレクトリ。
    pub cwd: PathBuf,
    /// `cwd` を開いた fd（`O_CLOEXEC`）。子プロセスの `fchdir` に使う。
    cwd_fd: OwnedFd,
}

impl Shell {
    /// プロセスの現在のディレクトリから作成する。
    pub fn new() -> io::Result<Self> {
        Self::with_cwd(env::current_dir()?)
    }

    pub fn with_cwd(cwd: PathBuf) -> io::Result<Self> {
        let cwd_fd = open_dir(&cwd)?;
        Ok(Self { cwd, cwd_fd })
    }

    /// 作業ディレクトリを `dir` に切り替える。開けなければ状態は変えない。
    pub fn set_cwd(&mut self, dir: PathBuf) -> io::Result<()> {
        self.cwd_fd = open_dir(&dir)?;
        self.cwd = dir;
        Ok(())
    }

    pub fn cwd_fd(&self) -> RawFd {
        self.cwd_fd.as_raw_fd()
    }
}

/// ディレクトリを `fchdir` 用に開く。
///
/// Linux では `O_PATH` を使うため、読み取り権限のない（検索権限のみの）ディレクトリも開ける。
fn open_dir(path: &Path) -> io::Result<OwnedFd> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    #[cfg(target_os = "linux")]
    let flags = libc::O_PATH | libc::O_DIRECTORY | libc::O_CLOEXEC;
    #[cfg(not(target_os = "linux"))]
    let flags = libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC;

    let fd = unsafe { libc::open(c_path.as_ptr(), flags) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// プロセスを即座に終了する。
///
/// 入力終端・読み取りエラー・確保失敗時に [`LineReader`](crate::reader::LineReader) からのみ呼ばれる。
/// 通常のディスパッチ（`exit` ビルトイン）はこの経路を通らず [`Flow::Stop`] を返す。
pub fn terminate(code: i32) -> ! {
    let _ = io::stdout().flush();
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cwd_keeps_state_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = Shell::with_cwd(dir.path().to_path_buf()).unwrap();
        let before_fd = shell.cwd_fd();
        assert!(shell.set_cwd(dir.path().join("missing")).is_err());
        assert_eq!(shell.cwd, dir.path());
        assert_eq!(shell.cwd_fd(), before_fd);
    }

    #[test]
    fn with_cwd_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "x").unwrap();
        let e = Shell::with_cwd(file).unwrap_err();
        assert_eq!(e.raw_os_error(), Some(libc::ENOTDIR));
    }
}
