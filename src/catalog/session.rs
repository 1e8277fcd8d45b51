//! 单次会话的查询/选择状态机。
//!
//! 所有交互态集中在 [`Session`] 一个结构里，由 UI 层驱动：
//! 发起搜索拿到序号令牌，响应回来时凭令牌应用，过期响应直接丢弃，
//! 避免并发搜索出现“后发先至”覆盖新结果。

use tracing::debug;

use super::client::{SearchError, SearchOutcome};
use super::detail::{self, BookDetail};
use super::records::{BookSummary, SearchCriterion};

/// 交互阶段。错误是叠加显示的，不单独成一个阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    ResultsShown,
    DetailLoading,
    DetailShown,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub index: usize,
    pub detail: BookDetail,
}

#[derive(Debug, Default)]
pub struct Session {
    /// 搜索框内容，随输入实时变化；空串也允许发搜索。
    pub query: String,
    pub search_by: SearchCriterion,

    results: Vec<BookSummary>,
    total: u64,
    error: Option<String>,
    selection: Option<Selection>,
    cover: Option<String>,
    phase: Phase,

    search_seq: u64,
    select_seq: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn results(&self) -> &[BookSummary] {
        &self.results
    }

    /// 后端报告的命中总数，可能大于实际展示行数。
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// 封面 URL；仅在选中详情且远端确认存在后才会有值。
    pub fn cover(&self) -> Option<&str> {
        self.cover.as_deref()
    }

    /// 发起一次搜索，返回本次请求的序号令牌。
    ///
    /// 新搜索会放弃当前选中项；结果列表保持原样直到响应应用。
    pub fn begin_search(&mut self) -> u64 {
        self.selection = None;
        self.cover = None;
        self.phase = Phase::Searching;
        self.search_seq += 1;
        self.search_seq
    }

    /// 应用搜索响应。令牌不是最新发出的那一个时丢弃，返回 false。
    ///
    /// 成功：整体替换结果与总数，并清除遗留错误。
    /// 失败：只记错误消息，结果与总数不动，回到之前可见的视图。
    pub fn apply_search(
        &mut self,
        seq: u64,
        outcome: Result<SearchOutcome, SearchError>,
    ) -> bool {
        if seq != self.search_seq {
            debug!("丢弃过期搜索响应: seq={} 最新={}", seq, self.search_seq);
            return false;
        }

        match outcome {
            Ok(found) => {
                self.results = found.summaries;
                self.total = found.total;
                self.error = None;
                self.phase = Phase::ResultsShown;
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.phase = if self.results.is_empty() {
                    Phase::Idle
                } else {
                    Phase::ResultsShown
                };
            }
        }
        true
    }

    /// 选中当前结果列表里的一行，返回封面请求用的令牌。
    ///
    /// 详情投影同步完成；封面此时必然为空，由 UI 随后异步解析。
    pub fn select(&mut self, index: usize) -> Option<u64> {
        let summary = self.results.get(index)?;
        self.selection = Some(Selection {
            index,
            detail: detail::select_detail(summary),
        });
        self.cover = None;
        self.phase = Phase::DetailLoading;
        self.select_seq += 1;
        Some(self.select_seq)
    }

    /// 当前选中项的首个 ISBN；无 ISBN 时封面解析应被跳过。
    pub fn selected_isbn(&self) -> Option<&str> {
        self.selection.as_ref()?.detail.isbn.as_deref()
    }

    /// 应用封面解析结果。选择已变化或已取消时丢弃。
    pub fn apply_cover(&mut self, seq: u64, url: Option<String>) -> bool {
        if seq != self.select_seq || self.selection.is_none() {
            debug!("丢弃过期封面响应: seq={}", seq);
            return false;
        }
        self.cover = url;
        self.phase = Phase::DetailShown;
        true
    }

    /// 无 ISBN 时跳过封面解析，直接进入详情展示。
    pub fn skip_cover(&mut self) {
        if self.selection.is_some() {
            self.phase = Phase::DetailShown;
        }
    }

    /// 返回结果列表：无条件清掉选中项与封面，结果与总数保持原样。
    pub fn go_back(&mut self) {
        self.selection = None;
        self.cover = None;
        self.phase = if self.results.is_empty() {
            Phase::Idle
        } else {
            Phase::ResultsShown
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::client::parse_search_body;
    use serde_json::json;

    fn outcome(n: usize, total: u64) -> SearchOutcome {
        let docs: Vec<serde_json::Value> = (0..n)
            .map(|i| {
                json!({
                    "title": format!("书 {i}"),
                    "author_name": ["某作者"],
                    "isbn": [format!("isbn-{i}")],
                })
            })
            .collect();
        parse_search_body(&json!({ "numFound": total, "docs": docs })).unwrap()
    }

    #[test]
    fn search_replaces_results_and_total() {
        let mut s = Session::new();
        let seq = s.begin_search();
        assert_eq!(s.phase(), Phase::Searching);

        assert!(s.apply_search(seq, Ok(outcome(50, 120))));
        assert_eq!(s.phase(), Phase::ResultsShown);
        assert_eq!(s.results().len(), 30);
        assert_eq!(s.total(), 120);
    }

    #[test]
    fn zero_results_still_enters_results_shown() {
        let mut s = Session::new();
        let seq = s.begin_search();
        assert!(s.apply_search(seq, Ok(outcome(0, 0))));
        assert_eq!(s.phase(), Phase::ResultsShown);
        assert!(s.results().is_empty());
    }

    #[test]
    fn failed_search_sets_error_and_keeps_results() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(5, 5)));
        let before: Vec<_> = s.results().to_vec();

        let seq = s.begin_search();
        assert!(s.apply_search(seq, Err(SearchError::Status(500))));
        assert!(!s.error().unwrap().is_empty());
        assert_eq!(s.results(), &before[..]);
        assert_eq!(s.total(), 5);
        assert_eq!(s.phase(), Phase::ResultsShown);
    }

    #[test]
    fn successful_search_clears_previous_error() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Err(SearchError::Transport("断网".to_string())));
        assert!(s.error().is_some());

        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(1, 1)));
        assert!(s.error().is_none());
    }

    #[test]
    fn stale_search_response_is_discarded() {
        let mut s = Session::new();
        let old = s.begin_search();
        let new = s.begin_search();

        // 旧请求后到：丢弃
        assert!(!s.apply_search(old, Ok(outcome(3, 3))));
        assert!(s.results().is_empty());

        assert!(s.apply_search(new, Ok(outcome(7, 7))));
        assert_eq!(s.results().len(), 7);
    }

    #[test]
    fn select_builds_detail_and_clears_cover() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(3, 3)));

        let token = s.select(1).unwrap();
        assert_eq!(s.phase(), Phase::DetailLoading);
        assert_eq!(s.selection().unwrap().index, 1);
        assert!(s.cover().is_none());
        assert_eq!(s.selected_isbn(), Some("isbn-1"));

        assert!(s.apply_cover(token, Some("http://例/封面.jpg".to_string())));
        assert_eq!(s.phase(), Phase::DetailShown);
        assert!(s.cover().is_some());
    }

    #[test]
    fn select_out_of_range_is_rejected() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(2, 2)));
        assert!(s.select(2).is_none());
        assert!(s.selection().is_none());
    }

    #[test]
    fn cover_absent_is_not_an_error() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(1, 1)));
        let token = s.select(0).unwrap();

        // 封面 404：保持 absent，不落错误槽
        assert!(s.apply_cover(token, None));
        assert!(s.cover().is_none());
        assert!(s.error().is_none());
        assert_eq!(s.phase(), Phase::DetailShown);
    }

    #[test]
    fn stale_cover_response_is_discarded() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(2, 2)));

        let old = s.select(0).unwrap();
        let _new = s.select(1).unwrap();
        assert!(!s.apply_cover(old, Some("http://旧".to_string())));
        assert!(s.cover().is_none());
    }

    #[test]
    fn cover_after_back_is_discarded() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(1, 1)));
        let token = s.select(0).unwrap();
        s.go_back();

        assert!(!s.apply_cover(token, Some("http://迟到".to_string())));
        assert!(s.cover().is_none());
    }

    #[test]
    fn back_restores_exact_result_list() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(10, 42)));
        let before: Vec<_> = s.results().to_vec();

        let token = s.select(3).unwrap();
        s.apply_cover(token, Some("http://有".to_string()));
        s.go_back();

        assert_eq!(s.phase(), Phase::ResultsShown);
        assert!(s.selection().is_none());
        assert!(s.cover().is_none());
        assert_eq!(s.results(), &before[..]);
        assert_eq!(s.total(), 42);
    }

    #[test]
    fn skip_cover_without_isbn() {
        let mut s = Session::new();
        let docs = json!({ "numFound": 1, "docs": [{ "title": "无码书" }] });
        let seq = s.begin_search();
        s.apply_search(seq, Ok(parse_search_body(&docs).unwrap()));

        s.select(0).unwrap();
        assert!(s.selected_isbn().is_none());
        s.skip_cover();
        assert_eq!(s.phase(), Phase::DetailShown);
        assert!(s.cover().is_none());
    }

    #[test]
    fn new_search_drops_selection() {
        let mut s = Session::new();
        let seq = s.begin_search();
        s.apply_search(seq, Ok(outcome(2, 2)));
        s.select(0).unwrap();

        s.begin_search();
        assert!(s.selection().is_none());
        assert!(s.cover().is_none());
    }
}
