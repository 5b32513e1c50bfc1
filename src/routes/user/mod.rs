mod change_password;
mod delete_account;
mod get_user;
mod login;
mod sign_out;
mod signup;
mod util;

pub use change_password::*;
pub use delete_account::*;
pub use get_user::*;
pub use login::*;
pub use sign_out::*;
pub use signup::*;
pub use util::*;
