use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

/// Query-string pagination, 1-based pages with clamped page size.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), MAX_PAGE_SIZE);

        let q = PageQuery {
            page: Some(-3),
            limit: Some(0),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 1);
    }

    #[test]
    fn test_offset() {
        let q = PageQuery {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(q.offset(), 40);
    }
}
