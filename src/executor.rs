//! ディスパッチ: トークン列をビルトインまたは外部コマンドに振り分ける。
//!
//! - 空のトークン列（空行）: 何もせず [`Flow::Continue`]
//! - 先頭トークンがビルトイン: fork なしでハンドラを呼び、その結果を返す（名前の照合だけ `&str` で行う）
//! - それ以外: stdout をフラッシュしてから [`spawn::launch`] で外部コマンドとして実行

use std::io::Write;

use log::trace;

use crate::builtins;
use crate::shell::{Flow, Shell};
use crate::spawn;

/// トークン列を実行し、メインループを続けるかどうかを返す。
pub fn execute(
    shell: &mut Shell,
    args: &[&[u8]],
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Flow {
    let Some(&first) = args.first() else {
        return Flow::Continue;
    };

    // ビルトイン名はすべて ASCII なので、UTF-8 でない名前は外部コマンド扱い
    let builtin = std::str::from_utf8(first).ok().and_then(builtins::lookup);
    if let Some(builtin) = builtin {
        trace!("builtin: {}", builtin.name);
        return (builtin.handler)(shell, args, out, err);
    }

    // 子プロセスに未出力のバッファを残さない
    let _ = out.flush();
    spawn::launch(shell, args, err)
}
