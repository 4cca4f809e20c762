use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Sentinel the metadata service uses for "not available"
pub const NOT_AVAILABLE: &str = "N/A";

const PLOT_UNAVAILABLE: &str = "Plot information not available.";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// A movie or series as returned by search and stored in the watchlist
///
/// Field names follow the OMDb wire format so that search results, HTTP
/// payloads and persisted snapshots all share one shape.
/// Identity is the IMDb id alone: two `Movie`s with the same id are equal
/// even if their display fields differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default = "not_available")]
    pub year: String,
    /// Category tag such as `movie`, `series` or `episode`
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "Poster", default = "not_available")]
    pub poster: String,
}

impl Movie {
    pub fn new(imdb_id: impl Into<String>, title: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            title: title.into(),
            year: year.into(),
            kind: None,
            poster: not_available(),
        }
    }

    /// False when the service reported no poster image
    pub fn has_poster(&self) -> bool {
        !self.poster.is_empty() && self.poster != NOT_AVAILABLE
    }
}

impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.imdb_id == other.imdb_id
    }
}

impl Eq for Movie {}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.imdb_id.hash(state);
    }
}

/// Extended metadata for a single title, fetched on demand
///
/// Every descriptive field is free-form text; absent values hold
/// [`NOT_AVAILABLE`] rather than an empty string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(rename = "Plot", default = "not_available")]
    pub plot: String,
    #[serde(rename = "Director", default = "not_available")]
    pub director: String,
    #[serde(rename = "Writer", default = "not_available")]
    pub writer: String,
    #[serde(rename = "Actors", default = "not_available")]
    pub actors: String,
    #[serde(rename = "Genre", default = "not_available")]
    pub genre: String,
    #[serde(rename = "Runtime", default = "not_available")]
    pub runtime: String,
    #[serde(rename = "imdbRating", default = "not_available")]
    pub imdb_rating: String,
    #[serde(rename = "imdbVotes", default = "not_available")]
    pub imdb_votes: String,
    #[serde(rename = "Rated", default = "not_available")]
    pub rated: String,
    #[serde(rename = "Released", default = "not_available")]
    pub released: String,
    #[serde(rename = "Country", default = "not_available")]
    pub country: String,
    #[serde(rename = "Language", default = "not_available")]
    pub language: String,
    #[serde(rename = "Awards", default = "not_available")]
    pub awards: String,
}

impl MovieDetails {
    /// Placeholder shown when the details lookup fails, so the modal stays usable
    pub fn unavailable(movie: Movie) -> Self {
        Self {
            movie,
            plot: PLOT_UNAVAILABLE.to_string(),
            director: not_available(),
            writer: not_available(),
            actors: not_available(),
            genre: not_available(),
            runtime: not_available(),
            imdb_rating: not_available(),
            imdb_votes: not_available(),
            rated: not_available(),
            released: not_available(),
            country: not_available(),
            language: not_available(),
            awards: not_available(),
        }
    }

    pub fn imdb_id(&self) -> &str {
        &self.movie.imdb_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_uses_id_only() {
        let a = Movie::new("tt0372784", "Batman Begins", "2005");
        let mut b = Movie::new("tt0372784", "Batman Begins (re-release)", "2006");
        b.kind = Some("movie".to_string());

        assert_eq!(a, b);
        assert_ne!(a, Movie::new("tt0468569", "The Dark Knight", "2008"));
    }

    #[test]
    fn test_search_item_deserialization() {
        let json = r#"{
            "Title": "Batman Begins",
            "Year": "2005",
            "imdbID": "tt0372784",
            "Type": "movie",
            "Poster": "https://m.media-amazon.com/images/M/poster.jpg"
        }"#;

        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.imdb_id, "tt0372784");
        assert_eq!(movie.title, "Batman Begins");
        assert_eq!(movie.kind.as_deref(), Some("movie"));
        assert!(movie.has_poster());
    }

    #[test]
    fn test_missing_poster_is_not_available() {
        let movie: Movie =
            serde_json::from_str(r#"{"imdbID": "tt1", "Title": "Untitled"}"#).unwrap();
        assert_eq!(movie.poster, NOT_AVAILABLE);
        assert_eq!(movie.year, NOT_AVAILABLE);
        assert!(!movie.has_poster());
    }

    #[test]
    fn test_serialization_keeps_wire_names() {
        let movie = Movie::new("tt1", "Title", "1999");
        let value = serde_json::to_value(&movie).unwrap();

        assert_eq!(value["imdbID"], "tt1");
        assert_eq!(value["Title"], "Title");
        assert!(value.get("Type").is_none());
    }

    #[test]
    fn test_details_flatten_and_defaults() {
        let json = r#"{
            "Title": "The Dark Knight",
            "Year": "2008",
            "Rated": "PG-13",
            "Director": "Christopher Nolan",
            "imdbRating": "9.0",
            "imdbID": "tt0468569",
            "Type": "movie",
            "Poster": "N/A",
            "Ratings": [{"Source": "Internet Movie Database", "Value": "9.0/10"}],
            "Response": "True"
        }"#;

        let details: MovieDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.imdb_id(), "tt0468569");
        assert_eq!(details.director, "Christopher Nolan");
        assert_eq!(details.imdb_rating, "9.0");
        assert_eq!(details.awards, NOT_AVAILABLE);
    }

    #[test]
    fn test_unavailable_placeholder() {
        let details = MovieDetails::unavailable(Movie::new("tt1", "Title", "1999"));

        assert_eq!(details.movie.title, "Title");
        assert_eq!(details.plot, "Plot information not available.");
        assert_eq!(details.director, NOT_AVAILABLE);
        assert_eq!(details.awards, NOT_AVAILABLE);
    }
}
