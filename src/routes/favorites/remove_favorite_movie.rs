use actix_web::{
    web::{Data, Path},
    HttpRequest, HttpResponse,
};
use serde_json::json;
use tracing::Instrument;

use crate::store::{FeedbackStore, Store};
use crate::util::{current_session, missing_session_response, store_error_response};

pub async fn remove_favorite_movie(
    store: Data<dyn Store>,
    path: Path<i32>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let movie_id = path.into_inner();
    let query_span = tracing::info_span!("Remove favorite movie", movie_id, user_id);

    match store
        .remove_favorite(movie_id, user_id)
        .instrument(query_span)
        .await
    {
        Ok(true) => {
            tracing::info!("Favorite removed");
            HttpResponse::Ok().json(json!({
                "data": {
                    "movie_id": movie_id,
                    "is_favorite": false,
                }
            }))
        }
        Ok(false) => {
            tracing::info!("Movie was not in the favorites list");
            HttpResponse::NotFound().json(json!({
                "error": "Favorite not found"
            }))
        }
        Err(err) => store_error_response(err),
    }
}
