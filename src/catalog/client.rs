//! 搜索接口与封面接口的 HTTP 客户端。
//!
//! 搜索词走 reqwest 的 query 编码，保留 URL 保留字符也不会拼出坏请求。
//! 封面只做存在性确认：2xx 即认为可用，失败静默视作“无封面”。

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::base_system::context::Config;
use crate::catalog::records::{self, BookSummary, SearchCriterion};

/// 搜索失败的两类成因；对用户只呈现为一条文本消息。
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("网络请求失败: {0}")]
    Transport(String),
    #[error("接口返回异常状态: HTTP {0}")]
    Status(u16),
    #[error("响应格式异常: {0}")]
    Malformed(String),
}

/// 一次搜索的完整结果：截断后的展示行 + 后端报告的总数。
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub summaries: Vec<BookSummary>,
    pub total: u64,
}

pub struct CatalogClient {
    client: Client,
    search_base: String,
    cover_base: String,
}

impl CatalogClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or(HeaderValue::from_static("openlib-explorer")),
        );

        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            search_base: config.search_base.clone(),
            cover_base: config.cover_base.clone(),
        })
    }

    /// `GET {search_base}?{field}={term}`，term 允许为空串。
    pub fn search(
        &self,
        term: &str,
        criterion: SearchCriterion,
    ) -> Result<SearchOutcome, SearchError> {
        debug!("开始搜索: {}={}", criterion.param(), term);

        let resp = self
            .client
            .get(&self.search_base)
            .query(&[(criterion.param(), term)])
            .send()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: Value = resp
            .json()
            .map_err(|e| SearchError::Malformed(e.to_string()))?;
        parse_search_body(&body)
    }

    /// 封面地址：`{cover_base}/b/isbn/{isbn}-M.jpg`。
    pub fn cover_url(&self, isbn: &str) -> String {
        format!("{}/b/isbn/{}-M.jpg", self.cover_base, isbn)
    }

    /// 确认封面资源存在则返回其 URL；任何失败都视作无封面，不算错误。
    pub fn resolve_cover(&self, isbn: &str) -> Option<String> {
        let url = self.cover_url(isbn);
        match self.client.get(&url).send() {
            Ok(resp) if resp.status().is_success() => Some(url),
            Ok(resp) => {
                debug!("封面不存在: {} (HTTP {})", url, resp.status().as_u16());
                None
            }
            Err(e) => {
                warn!("封面检查失败（忽略）: {e}");
                None
            }
        }
    }

    /// 拉取封面图片字节，ASCII 预览用。
    pub fn fetch_cover_bytes(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}

/// 响应体必须带 `docs` 数组与 `numFound` 整数，缺一即为格式异常。
pub(crate) fn parse_search_body(body: &Value) -> Result<SearchOutcome, SearchError> {
    let docs = body
        .get("docs")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::Malformed("响应缺少 docs 数组".to_string()))?;
    let total = body
        .get("numFound")
        .and_then(Value::as_u64)
        .ok_or_else(|| SearchError::Malformed("响应缺少 numFound".to_string()))?;

    Ok(SearchOutcome {
        summaries: records::project(docs),
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_docs_and_total() {
        let docs: Vec<Value> = (0..50)
            .map(|i| json!({ "title": format!("fantasy {i}") }))
            .collect();
        let body = json!({ "numFound": 120, "docs": docs });

        let outcome = parse_search_body(&body).unwrap();
        assert_eq!(outcome.summaries.len(), 30);
        assert_eq!(outcome.total, 120);
    }

    #[test]
    fn zero_results_is_not_an_error() {
        let body = json!({ "numFound": 0, "docs": [] });
        let outcome = parse_search_body(&body).unwrap();
        assert!(outcome.summaries.is_empty());
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn missing_docs_is_malformed() {
        let err = parse_search_body(&json!({ "numFound": 3 })).unwrap_err();
        assert!(matches!(err, SearchError::Malformed(_)));
    }

    #[test]
    fn missing_total_is_malformed() {
        let err = parse_search_body(&json!({ "docs": [] })).unwrap_err();
        assert!(matches!(err, SearchError::Malformed(_)));
    }

    #[test]
    fn docs_of_wrong_type_is_malformed() {
        let err = parse_search_body(&json!({ "numFound": 1, "docs": "oops" })).unwrap_err();
        assert!(matches!(err, SearchError::Malformed(_)));
    }

    #[test]
    fn error_messages_are_non_empty() {
        for err in [
            SearchError::Transport("connection refused".to_string()),
            SearchError::Status(500),
            SearchError::Malformed("bad".to_string()),
        ] {
            assert!(!err.to_string().is_empty());
        }
    }
}
