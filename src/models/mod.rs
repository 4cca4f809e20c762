pub mod movie;
pub mod omdb;
pub mod preferences;

pub use movie::{Movie, MovieDetails, NOT_AVAILABLE};
pub use omdb::{OmdbSearchResponse, OmdbStatus};
pub use preferences::Theme;
