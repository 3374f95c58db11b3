//! # Mimizuku CLI Library
//!
//! タクソノミー構築エンジンのコマンドラインインターフェース
//! JSON 知識ベースの分類・実現・階層クエリをコマンドラインから実行

pub mod commands;
pub mod interactive;

pub use commands::*;
pub use interactive::*;
