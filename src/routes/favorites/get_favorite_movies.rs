use actix_web::{web::Data, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::Instrument;

use crate::store::{FeedbackStore, Store};
use crate::util::{current_session, missing_session_response, store_error_response};

pub async fn get_favorite_movies(store: Data<dyn Store>, req: HttpRequest) -> HttpResponse {
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let query_span = tracing::info_span!("Fetching favorite movies", user_id);

    match store.favorite_movies(user_id).instrument(query_span).await {
        Ok(favorites) => HttpResponse::Ok().json(json!({
            "data": favorites
        })),
        Err(err) => store_error_response(err),
    }
}
