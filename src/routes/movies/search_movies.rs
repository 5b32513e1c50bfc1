use actix_web::{
    web::{Data, Query},
    HttpRequest, HttpResponse,
};
use serde_json::json;
use tracing::Instrument;

use crate::search::{search_movies, SearchRequest};
use crate::store::Store;
use crate::util::{current_session, store_error_response};

pub async fn get_movies_search(
    store: Data<dyn Store>,
    info: Query<SearchRequest>,
    req: HttpRequest,
) -> HttpResponse {
    let viewer = current_session(&req).map(|session| session.user.id);
    let query_span = tracing::info_span!("Movie search result", ?viewer, request = ?info);

    match search_movies(store.get_ref(), &info, viewer)
        .instrument(query_span)
        .await
    {
        Ok(results) => {
            tracing::info!("Got {} search results", results.results.len());
            HttpResponse::Ok().json(json!({
                "data": results
            }))
        }
        Err(err) => store_error_response(err),
    }
}
