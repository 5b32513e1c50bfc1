use actix_web::{
    web::{Data, Json, Path},
    HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use validator::Validate;

use crate::store::{CatalogStore, FeedbackStore, Store};
use crate::util::{
    current_session, missing_session_response, store_error_response, validation_error_response,
};

#[derive(Deserialize, Validate, Debug)]
pub struct RatingBody {
    #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
    pub value: i32,
}

pub async fn rate_movie(
    store: Data<dyn Store>,
    path: Path<i32>,
    body: Json<RatingBody>,
    req: HttpRequest,
) -> HttpResponse {
    if let Err(error) = body.validate() {
        return validation_error_response(error);
    }
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let movie_id = path.into_inner();
    let query_span = tracing::info_span!("Rate movie", movie_id, user_id, value = body.value);

    let result = async {
        store.upsert_rating(movie_id, user_id, body.value).await?;
        store.movie(movie_id).await
    }
    .instrument(query_span)
    .await;

    match result {
        Ok(movie) => {
            tracing::info!("Rating saved");
            HttpResponse::Ok().json(json!({
                "data": {
                    "movie_id": movie_id,
                    "value": body.value,
                    "rating": movie.and_then(|movie| movie.rating),
                }
            }))
        }
        Err(err) => store_error_response(err),
    }
}
