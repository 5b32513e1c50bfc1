mod manage_movies;
mod manage_users;
mod util;

pub use manage_movies::*;
pub use manage_users::*;
pub use util::*;
