mod get_favorite_movies;
mod remove_favorite_movie;
mod util;

pub use get_favorite_movies::*;
pub use remove_favorite_movie::*;
pub use util::*;
