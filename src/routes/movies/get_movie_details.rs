use actix_web::{
    web::{Data, Path},
    HttpRequest, HttpResponse,
};
use serde_json::json;
use tracing::Instrument;

use crate::comment_tree::assemble;
use crate::models::MovieDetails;
use crate::store::{CatalogStore, FeedbackStore, Store, StoreError};
use crate::util::{current_session, store_error_response};

/// Movie fields, the assembled comment tree and the viewer's own rating and
/// favorite state.
pub async fn load_movie_details<S>(
    store: &S,
    movie_id: i32,
    viewer: Option<i32>,
) -> Result<MovieDetails, StoreError>
where
    S: CatalogStore + FeedbackStore + ?Sized,
{
    let movie = store
        .movie(movie_id)
        .await?
        .ok_or(StoreError::NotFound("Movie"))?;
    let comments = assemble(store.comments_for_movie(movie_id).await?);
    let mut details = MovieDetails::new(movie, comments);
    if let Some(user_id) = viewer {
        details.user_rating = store.user_rating(movie_id, user_id).await?;
        details.is_favorite = store.is_favorite(movie_id, user_id).await?;
    }
    Ok(details)
}

pub async fn get_movie_details(
    store: Data<dyn Store>,
    path: Path<i32>,
    req: HttpRequest,
) -> HttpResponse {
    let movie_id = path.into_inner();
    let viewer = current_session(&req).map(|session| session.user.id);
    let query_span = tracing::info_span!("Fetching movie details", movie_id, ?viewer);

    match load_movie_details(store.get_ref(), movie_id, viewer)
        .instrument(query_span)
        .await
    {
        Ok(details) => HttpResponse::Ok().json(json!({
            "data": details
        })),
        Err(err) => store_error_response(err),
    }
}
