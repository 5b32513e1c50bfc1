use actix_web::{
    web::{Data, Path},
    HttpRequest, HttpResponse,
};
use serde_json::json;
use tracing::Instrument;

use crate::store::{FeedbackStore, Store};
use crate::util::{current_session, missing_session_response, store_error_response};

pub async fn toggle_favorite(
    store: Data<dyn Store>,
    path: Path<i32>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let movie_id = path.into_inner();
    let query_span = tracing::info_span!("Toggle favorite movie", movie_id, user_id);

    match store
        .toggle_favorite(movie_id, user_id)
        .instrument(query_span)
        .await
    {
        Ok(is_favorite) => {
            tracing::info!("Favorite state is now {}", is_favorite);
            HttpResponse::Ok().json(json!({
                "data": {
                    "movie_id": movie_id,
                    "is_favorite": is_favorite,
                }
            }))
        }
        Err(err) => store_error_response(err),
    }
}
