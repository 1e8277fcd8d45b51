//! Open Library 目录检索核心。
//!
//! - `records`：搜索结果记录的归一化投影（纯函数）
//! - `detail`：选中条目的详情投影（纯函数）
//! - `client`：搜索接口与封面接口的 HTTP 客户端
//! - `session`：单次会话的查询/选择状态机

pub mod client;
pub mod detail;
pub mod records;
pub mod session;
