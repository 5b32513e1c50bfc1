use actix_web::{web::Data, HttpResponse};
use serde_json::json;
use tracing::Instrument;

use crate::store::{CatalogStore, Store};
use crate::util::store_error_response;

pub const POPULAR_MOVIES_LIMIT: u32 = 12;

pub async fn get_popular_movies(store: Data<dyn Store>) -> HttpResponse {
    let query_span = tracing::info_span!("Fetching popular movies");
    match store
        .popular_movies(POPULAR_MOVIES_LIMIT)
        .instrument(query_span)
        .await
    {
        Ok(movies) => HttpResponse::Ok().json(json!({
            "data": movies
        })),
        Err(err) => store_error_response(err),
    }
}
