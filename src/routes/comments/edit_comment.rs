use actix_web::{
    web::{Data, Json, Path},
    HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use validator::Validate;

use super::validate_user_comment;
use crate::comment_tree::CommentNode;
use crate::store::{FeedbackStore, Store};
use crate::util::{
    current_session, missing_session_response, store_error_response, validation_error_response,
};

#[derive(Deserialize, Validate, Debug)]
pub struct EditCommentBody {
    #[validate(custom(function = "validate_user_comment"))]
    pub content: String,
}

pub async fn edit_comment(
    store: Data<dyn Store>,
    path: Path<i32>,
    body: Json<EditCommentBody>,
    req: HttpRequest,
) -> HttpResponse {
    if let Err(error) = body.validate() {
        return validation_error_response(error);
    }
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let comment_id = path.into_inner();
    let query_span = tracing::info_span!("Edit user comment", comment_id, user_id);

    match store
        .edit_comment(comment_id, user_id, body.content.trim())
        .instrument(query_span)
        .await
    {
        Ok(comment) => {
            tracing::info!("Comment edited successfully");
            HttpResponse::Ok().json(json!({
                "data": CommentNode::from(comment)
            }))
        }
        Err(err) => store_error_response(err),
    }
}
