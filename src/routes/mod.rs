pub mod admin;
pub mod comments;
pub mod favorites;
pub mod hello_world;
pub mod movies;
pub mod stats;
pub mod user;

pub use admin::*;
pub use comments::*;
pub use favorites::*;
pub use hello_world::*;
pub use movies::*;
pub use stats::*;
pub use user::*;
