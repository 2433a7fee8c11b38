//! トークナイザ: 入力行を空白区切りの引数列に分割する。
//!
//! トークンは入力行を借用するゼロコピーのバイトスライス（`&[u8]`）。
//! UTF-8 として解釈しないため、非 UTF-8 の引数もバイト単位でそのまま外部コマンドに渡る。
//! クォート、エスケープ、変数展開、リダイレクト等の構文は一切扱わない。
//! 区切り文字がトークンの中に現れることはない。

/// 区切り文字: スペース、タブ、CR、LF、ベル。
pub const DELIMITERS: [u8; 5] = [b' ', b'\t', b'\r', b'\n', 0x07];

/// 行をトークン列に分割する。
///
/// 連続する区切り文字は 1 つとして扱い、空トークンは生成しない。
/// 空行・区切り文字だけの行は空のベクタになる。
pub fn tokenize(line: &[u8]) -> Vec<&[u8]> {
    line.split(|b| DELIMITERS.contains(b))
        .filter(|t| !t.is_empty())
        .collect()
}
