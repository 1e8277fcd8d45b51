//! 选中条目的详情投影。
//!
//! 列表字段拼成可读字符串，缺省补 "N/A"；不依赖网络，永不失败。

use super::records::BookSummary;

/// 详情页展示的只读投影。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetail {
    pub title: String,
    pub authors: String,
    pub publishers: String,
    pub languages: String,
    pub subjects: String,
    pub first_publish_year: String,
    /// ISBN 列表首项，封面解析用；无则跳过封面。
    pub isbn: Option<String>,
}

/// 纯投影：同一 summary 上重复调用结果一致。
pub fn select_detail(summary: &BookSummary) -> BookDetail {
    BookDetail {
        title: summary
            .title
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
        authors: join_or_na(&summary.authors),
        publishers: join_or_na(&summary.publishers),
        languages: join_or_na(&summary.languages),
        subjects: join_or_na(&summary.subjects),
        first_publish_year: summary
            .first_publish_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        isbn: summary.isbns.first().cloned(),
    }
}

fn join_or_na(list: &[String]) -> String {
    if list.is_empty() {
        "N/A".to_string()
    } else {
        list.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::records::project;
    use serde_json::json;

    #[test]
    fn joins_lists_with_comma_space() {
        let rows = project(&[json!({
            "title": "双作者",
            "author_name": ["Jane Doe", "John Roe"],
            "publisher": ["社A", "社B"],
        })]);
        let detail = select_detail(&rows[0]);
        assert_eq!(detail.authors, "Jane Doe, John Roe");
        assert_eq!(detail.publishers, "社A, 社B");
    }

    #[test]
    fn missing_lists_render_na() {
        let rows = project(&[json!({ "title": "孤本" })]);
        let detail = select_detail(&rows[0]);
        assert_eq!(detail.authors, "N/A");
        assert_eq!(detail.publishers, "N/A");
        assert_eq!(detail.languages, "N/A");
        assert_eq!(detail.subjects, "N/A");
        assert_eq!(detail.first_publish_year, "N/A");
        assert_eq!(detail.isbn, None);
    }

    #[test]
    fn missing_title_renders_na() {
        let rows = project(&[json!({ "author_name": ["某人"] })]);
        assert_eq!(select_detail(&rows[0]).title, "N/A");
    }

    #[test]
    fn first_isbn_is_extracted() {
        let rows = project(&[json!({ "isbn": ["111", "222"] })]);
        assert_eq!(select_detail(&rows[0]).isbn.as_deref(), Some("111"));
    }

    #[test]
    fn idempotent_on_same_summary() {
        let rows = project(&[json!({
            "title": "样例",
            "author_name": ["甲", "乙"],
            "first_publish_year": 2001,
            "isbn": ["333"],
        })]);
        assert_eq!(select_detail(&rows[0]), select_detail(&rows[0]));
    }
}
