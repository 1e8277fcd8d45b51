//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 程序配置
    #[serde(default = "default_false")]
    pub old_cli: bool,

    // 网络配置
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // 接口配置
    #[serde(default = "default_search_base")]
    pub search_base: String,
    #[serde(default = "default_cover_base")]
    pub cover_base: String,

    // 展示配置
    #[serde(default = "default_true")]
    pub cover_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            old_cli: default_false(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            search_base: default_search_base(),
            cover_base: default_cover_base(),
            cover_preview: default_true(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        &[
            FieldMeta {
                name: "old_cli",
                description: "使用旧版纯文本 CLI（读屏友好），false 为 TUI",
            },
            FieldMeta {
                name: "request_timeout",
                description: "单次请求超时（秒）",
            },
            FieldMeta {
                name: "user_agent",
                description: "请求使用的 User-Agent（Open Library 建议带可识别标识）",
            },
            FieldMeta {
                name: "search_base",
                description: "搜索接口地址",
            },
            FieldMeta {
                name: "cover_base",
                description: "封面服务地址",
            },
            FieldMeta {
                name: "cover_preview",
                description: "详情页是否允许拉取封面并以 ASCII 预览",
            },
        ]
    }
}

fn default_false() -> bool {
    false
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("openlib-explorer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_search_base() -> String {
    "https://openlibrary.org/search.json".to_string()
}

fn default_cover_base() -> String {
    "https://covers.openlibrary.org".to_string()
}
