use serde::Deserialize;

use super::Movie;

// ============================================================================
// OMDb API Types
// ============================================================================

/// Top-level status flag every OMDb response carries
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbStatus {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

impl OmdbStatus {
    pub fn is_success(&self) -> bool {
        self.response.eq_ignore_ascii_case("true")
    }
}

/// Raw API response from `?s=<query>`
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchResponse {
    #[serde(flatten)]
    pub status: OmdbStatus,
    #[serde(rename = "Search", default)]
    pub search: Option<Vec<Movie>>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_success() {
        let json = r#"{
            "Search": [
                {"Title": "Batman Begins", "Year": "2005", "imdbID": "tt0372784", "Type": "movie", "Poster": "N/A"},
                {"Title": "The Batman", "Year": "2022", "imdbID": "tt1877830", "Type": "movie", "Poster": "N/A"}
            ],
            "totalResults": "602",
            "Response": "True"
        }"#;

        let response: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.status.is_success());
        assert_eq!(response.search.unwrap().len(), 2);
        assert_eq!(response.total_results.as_deref(), Some("602"));
    }

    #[test]
    fn test_search_response_not_found() {
        let json = r#"{"Response": "False", "Error": "Movie not found!"}"#;

        let response: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert!(!response.status.is_success());
        assert_eq!(response.status.error.as_deref(), Some("Movie not found!"));
        assert!(response.search.is_none());
    }
}
