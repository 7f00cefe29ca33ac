//! TMDB response types and normalization.

use marquee_core::{Page, ResultItem};
use serde::Deserialize;

/// Raw paged response from the TMDB list and search endpoints.
#[derive(Debug, Deserialize)]
pub struct PagedResponse {
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieRecord>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

/// Individual movie record from TMDB.
#[derive(Debug, Deserialize)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
}

impl From<MovieRecord> for ResultItem {
    fn from(raw: MovieRecord) -> Self {
        ResultItem {
            id: raw.id,
            title: raw.title,
            release_date: raw.release_date.filter(|d| !d.is_empty()),
            overview: raw.overview,
            poster_path: raw.poster_path,
            vote_average: raw.vote_average,
            vote_count: raw.vote_count,
        }
    }
}

impl From<PagedResponse> for Page {
    fn from(raw: PagedResponse) -> Self {
        Page {
            items: raw.results.into_iter().map(ResultItem::from).collect(),
            page: raw.page,
            total_pages: raw.total_pages,
            total_results: raw.total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_JSON: &str = r#"{
        "page": 1,
        "results": [
            {
                "adult": false,
                "id": 268,
                "title": "Batman",
                "release_date": "1989-06-23",
                "overview": "The Dark Knight of Gotham City begins his war on crime.",
                "poster_path": "/tDexQyu6FWltcd0VhEDK7uib42f.jpg",
                "vote_average": 7.2,
                "vote_count": 5000
            },
            {
                "id": 272,
                "title": "Batman Begins",
                "release_date": "",
                "poster_path": null
            }
        ],
        "total_pages": 12,
        "total_results": 231
    }"#;

    #[test]
    fn test_deserialize_paged_response() {
        let response: PagedResponse = serde_json::from_str(FIXTURE_JSON).unwrap();
        assert_eq!(response.page, 1);
        assert_eq!(response.total_pages, 12);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1].vote_count, None);
    }

    #[test]
    fn test_normalize_to_page() {
        let raw: PagedResponse = serde_json::from_str(FIXTURE_JSON).unwrap();
        let page: Page = raw.into();

        assert_eq!(page.page, 1);
        assert_eq!(page.total_results, 231);
        assert!(page.has_more_pages());

        let first = &page.items[0];
        assert_eq!(first.id, 268);
        assert_eq!(first.release_year(), Some("1989"));
        assert_eq!(first.vote_count, Some(5000));

        let second = &page.items[1];
        assert_eq!(second.release_date, None);
        assert_eq!(second.poster_path, None);
    }

    #[test]
    fn test_empty_results() {
        let raw: PagedResponse = serde_json::from_str(r#"{"page": 1, "results": [], "total_pages": 0, "total_results": 0}"#).unwrap();
        let page: Page = raw.into();

        assert!(page.items.is_empty());
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_missing_title_fails() {
        let result = serde_json::from_str::<PagedResponse>(r#"{"page": 1, "results": [{"id": 1}]}"#);
        assert!(result.is_err());
    }
}
