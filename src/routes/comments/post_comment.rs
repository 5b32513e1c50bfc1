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
use crate::models::NewComment;
use crate::store::{FeedbackStore, Store};
use crate::util::{
    current_session, missing_session_response, store_error_response, validation_error_response,
};

#[derive(Deserialize, Validate, Debug)]
pub struct CommentBody {
    #[validate(custom(function = "validate_user_comment"))]
    pub content: String,
    pub parent_id: Option<i32>,
}

pub async fn post_comment(
    store: Data<dyn Store>,
    path: Path<i32>,
    body: Json<CommentBody>,
    req: HttpRequest,
) -> HttpResponse {
    if let Err(error) = body.validate() {
        return validation_error_response(error);
    }
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let body = body.into_inner();
    let comment = NewComment {
        movie_id: path.into_inner(),
        user_id,
        content: body.content.trim().to_string(),
        parent_id: body.parent_id,
    };
    let query_span = tracing::info_span!("Post user comment", ?comment);

    match store.add_comment(comment).instrument(query_span).await {
        Ok(saved) => {
            tracing::info!("Comment {} saved", saved.id);
            HttpResponse::Created().json(json!({
                "data": CommentNode::from(saved)
            }))
        }
        Err(err) => store_error_response(err),
    }
}
