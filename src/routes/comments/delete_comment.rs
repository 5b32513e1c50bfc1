use actix_web::{
    web::{Data, Path},
    HttpRequest, HttpResponse,
};
use serde_json::json;
use tracing::Instrument;

use crate::store::{FeedbackStore, Store};
use crate::util::{current_session, missing_session_response, store_error_response};

pub async fn delete_comment(
    store: Data<dyn Store>,
    path: Path<i32>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let comment_id = path.into_inner();
    let query_span = tracing::info_span!("Delete user comment", comment_id, user_id);

    match store
        .delete_comment(comment_id, user_id)
        .instrument(query_span)
        .await
    {
        Ok(movie_id) => {
            tracing::info!("Comment delete successfully");
            HttpResponse::Ok().json(json!({
                "data": {
                    "comment_id": comment_id,
                    "movie_id": movie_id,
                }
            }))
        }
        Err(err) => store_error_response(err),
    }
}
