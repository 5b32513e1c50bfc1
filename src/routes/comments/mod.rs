mod delete_comment;
mod edit_comment;
mod post_comment;
mod util;

pub use delete_comment::*;
pub use edit_comment::*;
pub use post_comment::*;
pub use util::*;
