mod get_movie_details;
mod get_popular_movies;
mod rate_movie;
mod search_movies;
mod toggle_favorite;
mod util;

pub use get_movie_details::*;
pub use get_popular_movies::*;
pub use rate_movie::*;
pub use search_movies::*;
pub use toggle_favorite::*;
pub use util::*;
