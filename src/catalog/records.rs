//! 搜索结果的归一化投影。
//!
//! 接口返回的 doc 字段大量可缺省，这里统一兜底，并保留原始记录：
//! 详情页直接复用搜索载荷，不再发起第二次请求（封面除外）。

use serde_json::Value;

/// 客户端侧结果上限，与后端报告的总数无关。
pub const MAX_RESULTS: usize = 30;

/// 搜索字段选择，决定填充哪个查询参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchCriterion {
    #[default]
    Title,
    Author,
    Subject,
}

impl SearchCriterion {
    /// 查询参数名。
    pub fn param(self) -> &'static str {
        match self {
            SearchCriterion::Title => "title",
            SearchCriterion::Author => "author",
            SearchCriterion::Subject => "subject",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchCriterion::Title => "书名",
            SearchCriterion::Author => "作者",
            SearchCriterion::Subject => "主题",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SearchCriterion::Title => SearchCriterion::Author,
            SearchCriterion::Author => SearchCriterion::Subject,
            SearchCriterion::Subject => SearchCriterion::Title,
        }
    }
}

/// 结果列表中的一行。
#[derive(Debug, Clone, PartialEq)]
pub struct BookSummary {
    pub title: Option<String>,
    /// 作者列表首项，缺省时为 "N/A"。
    pub primary_author: String,
    pub authors: Vec<String>,
    pub publishers: Vec<String>,
    pub languages: Vec<String>,
    pub subjects: Vec<String>,
    pub first_publish_year: Option<i64>,
    pub isbns: Vec<String>,
    /// 原始记录，供详情页复用。
    pub raw: Value,
}

/// 把原始 doc 列表投影成展示行，按到达顺序截取前 [`MAX_RESULTS`] 条。
///
/// 纯函数：相同输入必得相同输出，不触网。
pub fn project(docs: &[Value]) -> Vec<BookSummary> {
    docs.iter().take(MAX_RESULTS).map(summarize).collect()
}

fn summarize(doc: &Value) -> BookSummary {
    let authors = pick_string_list(doc, "author_name");
    let primary_author = authors
        .first()
        .cloned()
        .unwrap_or_else(|| "N/A".to_string());

    BookSummary {
        title: pick_string(doc, "title"),
        primary_author,
        authors,
        publishers: pick_string_list(doc, "publisher"),
        languages: pick_string_list(doc, "language"),
        subjects: pick_string_list(doc, "subject"),
        first_publish_year: pick_year(doc),
        isbns: pick_string_list(doc, "isbn"),
        raw: doc.clone(),
    }
}

fn pick_string(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn pick_string_list(doc: &Value, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// 初版年份在历史数据里既出现过整数也出现过整数数组，两种都认。
fn pick_year(doc: &Value) -> Option<i64> {
    let v = doc.get("first_publish_year")?;
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_array()?.iter().find_map(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs_of(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "title": format!("书 {i}") })).collect()
    }

    #[test]
    fn caps_at_thirty_and_keeps_order() {
        let docs = docs_of(50);
        let rows = project(&docs);
        assert_eq!(rows.len(), MAX_RESULTS);
        assert_eq!(rows[0].title.as_deref(), Some("书 0"));
        assert_eq!(rows[29].title.as_deref(), Some("书 29"));
    }

    #[test]
    fn short_input_projects_fully() {
        assert_eq!(project(&docs_of(3)).len(), 3);
        assert!(project(&[]).is_empty());
    }

    #[test]
    fn missing_author_becomes_na() {
        let rows = project(&[json!({ "title": "孤本" })]);
        assert_eq!(rows[0].primary_author, "N/A");
        assert!(rows[0].authors.is_empty());
    }

    #[test]
    fn primary_author_is_first_entry() {
        let rows = project(&[json!({
            "title": "双作者",
            "author_name": ["Jane Doe", "John Roe"],
        })]);
        assert_eq!(rows[0].primary_author, "Jane Doe");
        assert_eq!(rows[0].authors, vec!["Jane Doe", "John Roe"]);
    }

    #[test]
    fn fields_pass_through() {
        let doc = json!({
            "title": "样例",
            "author_name": ["甲"],
            "publisher": ["出版社A", "出版社B"],
            "language": ["eng", "chi"],
            "subject": ["Fantasy"],
            "first_publish_year": 1984,
            "isbn": ["9780000000001"],
        });
        let rows = project(std::slice::from_ref(&doc));
        let row = &rows[0];
        assert_eq!(row.publishers, vec!["出版社A", "出版社B"]);
        assert_eq!(row.languages, vec!["eng", "chi"]);
        assert_eq!(row.subjects, vec!["Fantasy"]);
        assert_eq!(row.first_publish_year, Some(1984));
        assert_eq!(row.isbns, vec!["9780000000001"]);
        // 原始记录原样保留
        assert_eq!(row.raw, doc);
    }

    #[test]
    fn year_accepts_array_shape() {
        let rows = project(&[json!({ "first_publish_year": [1955, 1960] })]);
        assert_eq!(rows[0].first_publish_year, Some(1955));
    }

    #[test]
    fn projection_is_deterministic() {
        let docs = vec![json!({ "title": "a", "isbn": ["1"] })];
        assert_eq!(project(&docs), project(&docs));
    }

    #[test]
    fn criterion_params() {
        assert_eq!(SearchCriterion::default(), SearchCriterion::Title);
        assert_eq!(SearchCriterion::Title.param(), "title");
        assert_eq!(SearchCriterion::Author.param(), "author");
        assert_eq!(SearchCriterion::Subject.param(), "subject");
        assert_eq!(SearchCriterion::Subject.next(), SearchCriterion::Title);
    }
}
