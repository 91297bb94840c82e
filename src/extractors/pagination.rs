use serde::Deserialize;

/// Query parameters for the paginated user directory. Values are parsed
/// leniently; anything unparsable falls back to its default.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        parse_or(&self.page, 1).max(1)
    }

    pub fn limit(&self) -> i64 {
        clamp(parse_or(&self.limit, 50), 1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

pub fn parse_or(raw: &Option<String>, default: i64) -> i64 {
    raw.as_deref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub fn clamp(value: i64, min: i64, max: i64) -> i64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(String::from),
            limit: limit.map(String::from),
            search: None,
        }
    }

    #[test]
    fn defaults_apply_when_absent_or_garbled() {
        let p = params(None, None);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 50);
        assert_eq!(p.offset(), 0);

        let p = params(Some("abc"), Some("-"));
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn limits_clamp_into_range() {
        assert_eq!(params(None, Some("0")).limit(), 1);
        assert_eq!(params(None, Some("1")).limit(), 1);
        assert_eq!(params(None, Some("100")).limit(), 100);
        assert_eq!(params(None, Some("500")).limit(), 100);
    }

    #[test]
    fn page_floor_is_one() {
        assert_eq!(params(Some("0"), None).page(), 1);
        assert_eq!(params(Some("-3"), None).page(), 1);
        assert_eq!(params(Some("7"), None).page(), 7);
    }

    #[test]
    fn offset_combines_page_and_limit() {
        let p = params(Some("3"), Some("20"));
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn blank_search_is_none() {
        let mut p = params(None, None);
        p.search = Some(String::new());
        assert_eq!(p.search(), None);
        p.search = Some("bob".into());
        assert_eq!(p.search(), Some("bob"));
    }
}
