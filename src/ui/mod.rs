//! 交互层入口。
//!
//! 包含 TUI 与无 UI（旧 CLI）两套交互实现。

pub mod noui;
pub mod tui;
