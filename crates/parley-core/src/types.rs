use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of questions per history page.
pub const PAGE_SIZE: u64 = 10;

/// Number of characters of the first question used as a category title.
pub const TITLE_LENGTH: usize = 10;

/// A conversation category.
///
/// `code` is assigned once at creation. `title` stays `None` until the
/// first question in the category is answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Whether the category still waits for its first question.
    pub fn is_open(&self) -> bool {
        self.title.is_none()
    }
}

/// A stored question/answer exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub ask: Option<String>,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
    pub category_code: String,
}

/// One page of a category's question history, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPage {
    pub items: Vec<Question>,
    pub page: u64,
    pub total_pages: u64,
}

/// Derive a category title from the text of its first question.
pub fn title_from(text: &str) -> String {
    text.chars().take(TITLE_LENGTH).collect()
}

/// Parse a raw `page` query value. Anything that is not a plain positive
/// integer yields `None`.
pub fn parse_page(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|p| p.trim().parse::<u64>().ok())
}

/// Clamp a requested page against the number of available pages.
///
/// Missing, zero and out-of-range requests all fall back to the first page.
pub fn resolve_page(requested: Option<u64>, total_pages: u64) -> u64 {
    match requested {
        Some(page) if page >= 1 && page <= total_pages => page,
        _ => 1,
    }
}

/// Number of pages needed for `count` items. An empty history still has
/// one (empty) page.
pub fn total_pages(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_truncates() {
        assert_eq!(title_from("what is the weather today"), "what is th");
        assert_eq!(title_from("short"), "short");
    }

    #[test]
    fn test_title_from_counts_chars_not_bytes() {
        assert_eq!(title_from("今天天气怎么样呢朋友们你好"), "今天天气怎么样呢朋友");
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(25), 3);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), None);
        assert_eq!(parse_page(Some("2")), Some(2));
        assert_eq!(parse_page(Some(" 3 ")), Some(3));
        assert_eq!(parse_page(Some("abc")), None);
        assert_eq!(parse_page(Some("-1")), None);
    }

    #[test]
    fn test_resolve_page() {
        assert_eq!(resolve_page(None, 3), 1);
        assert_eq!(resolve_page(Some(2), 3), 2);
        assert_eq!(resolve_page(Some(3), 3), 3);
        assert_eq!(resolve_page(Some(0), 3), 1);
        assert_eq!(resolve_page(Some(4), 3), 1);
    }

    #[test]
    fn test_category_is_open() {
        let mut cat = Category {
            code: "c123456".to_string(),
            title: None,
            created_at: Utc::now(),
        };
        assert!(cat.is_open());
        cat.title = Some("hello".to_string());
        assert!(!cat.is_open());
    }
}
