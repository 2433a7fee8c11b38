//! tash ライブラリ — バイナリ・テスト・ベンチマーク用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`reader`] | 行リーダ（上限なしのバイト列バッファ、入力終端でプロセス終了） |
//! | [`parser`] | トークナイザ（空白区切りのみ、クォートなし、バイト列のまま） |
//! | [`builtins`] | ビルトイン（`cd`, `help`, `exit`） |
//! | [`spawn`] | 外部コマンド起動（`fork` + `fchdir` + `execvp`、終了までの `waitpid`） |
//! | [`executor`] | ディスパッチ（ビルトイン判定 → 外部コマンド） |
//! | [`shell`] | シェルの状態（作業ディレクトリとその fd）とループ制御 |
//!
//! ログは `log` ファサード経由で出力し、バイナリ側で `env_logger` を `TASH_LOG` から初期化する。

pub mod builtins;
pub mod executor;
pub mod parser;
pub mod reader;
pub mod shell;
pub mod spawn;
