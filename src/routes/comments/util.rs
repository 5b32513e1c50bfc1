use std::borrow::Cow;
use std::sync::Arc;

use actix_web::{web, Scope};
use validator::ValidationError;

use crate::middleware::Authentication;
use crate::store::Store;

use super::{delete_comment, edit_comment};

pub const MAX_COMMENT_LENGTH: usize = 2000;

pub fn validate_user_comment(comment: &str) -> Result<(), ValidationError> {
    if comment.is_empty() {
        return Err(ValidationError::new("Invalid Comment")
            .with_message(Cow::from("Comment can't be empty")));
    }

    if comment.trim().is_empty() {
        return Err(ValidationError::new("Invalid Comment")
            .with_message(Cow::from("Comment must contain non white space characters")));
    }

    if comment.trim().chars().count() > MAX_COMMENT_LENGTH {
        return Err(ValidationError::new("Invalid Comment").with_message(Cow::from(format!(
            "Comment must be at most {} characters long",
            MAX_COMMENT_LENGTH
        ))));
    }

    Ok(())
}

pub fn comment_source(store: &Arc<dyn Store>) -> Scope {
    web::scope("/comments")
        .route(
            "/{comment_id}",
            web::patch()
                .to(edit_comment)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/{comment_id}",
            web::delete()
                .to(delete_comment)
                .wrap(Authentication::required(store.clone())),
        )
}
