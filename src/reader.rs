//! 行リーダ: 入力から 1 行ずつ読み取る。
//!
//! バッファは `Vec<u8>` を `try_reserve` で伸長するため、行の長さに上限はなく切り詰めもしない。
//! 行はバイト列のまま返し、UTF-8 への変換はしない（非 UTF-8 のファイル名もそのまま exec に渡る）。
//! 入力終端と読み取りエラーはメインループに値として返さず、[`LineReader::read_line`] が
//! [`terminate`](crate::shell::terminate) でプロセスを終了する。

use std::fmt;
use std::io::{self, BufRead};

use log::debug;

use crate::shell;

/// 行の読み取りに失敗した理由。どちらもシェル全体にとって致命的。
#[derive(Debug)]
pub enum ReadError {
    /// 入力ストリームからの読み取りエラー。
    Io(io::Error),
    /// 行バッファの伸長に失敗した。
    Alloc,
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "tash: read: {}", e),
            Self::Alloc => write!(f, "tash: allocation error"),
        }
    }
}

/// 任意の [`BufRead`] から行を読み取るリーダ。
pub struct LineReader<R> {
    input: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// 1 行読み取る。末尾の `\n` は含まない。
    ///
    /// - `Ok(Some(line))` — 1 行読み取った（改行なしで終端に達した最終行も含む）
    /// - `Ok(None)` — 入力終端
    /// - `Err(_)` — 読み取りエラーまたはバッファ確保失敗
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>, ReadError> {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let available = match self.input.fill_buf() {
                Ok(b) => b,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadError::Io(e)),
            };

            if available.is_empty() {
                if buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(buf));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = match newline {
                Some(i) => &available[..i],
                None => available,
            };
            buf.try_reserve(chunk.len()).map_err(|_| ReadError::Alloc)?;
            buf.extend_from_slice(chunk);

            // 改行自体も消費する
            let consumed = chunk.len() + usize::from(newline.is_some());
            self.input.consume(consumed);

            if newline.is_some() {
                return Ok(Some(buf));
            }
        }
    }

    /// 1 行読み取る。入力終端なら正常終了、エラーなら診断を出して異常終了し、戻らない。
    pub fn read_line(&mut self) -> Vec<u8> {
        match self.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("end of input");
                shell::terminate(0)
            }
            Err(e) => {
                eprintln!("{}", e);
                shell::terminate(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    fn reader(input: &str) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(input.as_bytes().to_vec()))
    }

    /// 入力を最後まで読み、行のリストを返す。
    fn read_all(input: &str) -> Vec<Vec<u8>> {
        let mut r = reader(input);
        let mut lines = Vec::new();
        while let Some(line) = r.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn splits_on_newline() {
        assert_eq!(read_all("ls -l\ncd /tmp\n"), vec![b"ls -l".to_vec(), b"cd /tmp".to_vec()]);
    }

    #[test]
    fn empty_input_is_end() {
        assert!(reader("").next_line().unwrap().is_none());
    }

    #[test]
    fn blank_line_is_a_line() {
        assert_eq!(read_all("\n\nexit\n"), vec![Vec::new(), Vec::new(), b"exit".to_vec()]);
    }

    #[test]
    fn final_line_without_newline() {
        let mut r = reader("help\nexit");
        assert_eq!(r.next_line().unwrap().as_deref(), Some(&b"help"[..]));
        assert_eq!(r.next_line().unwrap().as_deref(), Some(&b"exit"[..]));
        assert!(r.next_line().unwrap().is_none());
    }

    #[test]
    fn keeps_carriage_return() {
        // \r の除去はトークナイザの責務
        assert_eq!(read_all("ls\r\n"), vec![b"ls\r".to_vec()]);
    }

    #[test]
    fn long_line_is_not_truncated() {
        let long = "x".repeat(100_000);
        let input = format!("echo {}\n", long);
        // 小さい内部バッファで fill_buf が何度も呼ばれるようにする
        let mut r = LineReader::new(BufReader::with_capacity(16, Cursor::new(input.into_bytes())));
        let line = r.next_line().unwrap().unwrap();
        assert_eq!(line.len(), 5 + long.len());
        assert_eq!(line.last(), Some(&b'x'));
    }

    #[test]
    fn non_utf8_bytes_are_kept() {
        let mut r = LineReader::new(Cursor::new(b"touch caf\xe9\xff\n".to_vec()));
        assert_eq!(r.next_line().unwrap().as_deref(), Some(&b"touch caf\xe9\xff"[..]));
    }

    /// 常にエラーを返すリーダ。
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(libc::EIO))
        }
    }

    #[test]
    fn read_error_is_reported() {
        let mut r = LineReader::new(BufReader::new(Broken));
        let err = r.next_line().unwrap_err();
        assert!(matches!(err, ReadError::Io(_)));
        assert!(err.to_string().starts_with("tash: read: "));
    }

    #[test]
    fn alloc_error_message() {
        assert_eq!(ReadError::Alloc.to_string(), "tash: allocation error");
    }
}
