mod get_statistics;
mod util;

pub use get_statistics::*;
pub use util::*;
