use std::borrow::Cow;

use actix_web::{
    web::{Data, Json, Path, Query},
    HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use validator::{Validate, ValidationError};

use super::ADMIN_PAGE_SIZE;
use crate::models::{ManagedMovie, MovieUpdate};
use crate::search::{clamp_page, pages_for, search_text, MovieFilter, PageWindow, SortOrder};
use crate::store::{AdminStore, CatalogStore, Store, StoreError};
use crate::util::{store_error_response, validation_error_response};

#[derive(Deserialize, Debug, Default)]
pub struct MovieListQuery {
    pub query: Option<String>,
    pub genre_id: Option<i32>,
    pub min_rating: Option<f64>,
    pub page: Option<i64>,
}

impl MovieListQuery {
    /// Title search plus the genre and rating facets, non-finite ratings ignored.
    pub fn to_filter(&self) -> MovieFilter {
        MovieFilter {
            title: search_text(self.query.as_deref()),
            genre_id: self.genre_id,
            min_rating: self.min_rating.filter(|rating| rating.is_finite()),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Validate, Debug)]
pub struct MovieEditBody {
    #[validate(custom(function = "validate_movie_title"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub genre_ids: Option<Vec<i32>>,
}

pub fn validate_movie_title(title: &str) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::new("Invalid title")
            .with_message(Cow::from("Title can't be empty")));
    }
    if title.chars().count() > 255 {
        return Err(ValidationError::new("Invalid title")
            .with_message(Cow::from("Title must be at most 255 characters")));
    }
    Ok(())
}

pub async fn list_movies(store: Data<dyn Store>, info: Query<MovieListQuery>) -> HttpResponse {
    let filter = info.to_filter();
    let page = clamp_page(info.page);
    let query_span = tracing::info_span!("Listing movies for admin", ?filter, page);

    let result = async {
        let total = store.count_movies(&filter).await?;
        let movies = store
            .find_movies(
                &filter,
                SortOrder::TitleAsc,
                PageWindow::sized(page, ADMIN_PAGE_SIZE),
            )
            .await?;
        Ok::<_, StoreError>((total, movies))
    }
    .instrument(query_span)
    .await;

    match result {
        Ok((total, movies)) => {
            let movies: Vec<ManagedMovie> = movies.into_iter().map(ManagedMovie::from).collect();
            HttpResponse::Ok().json(json!({
                "data": {
                    "movies": movies,
                    "total_movies": total,
                    "current_page": page,
                    "total_pages": pages_for(total, ADMIN_PAGE_SIZE),
                    "page_size": ADMIN_PAGE_SIZE
                }
            }))
        }
        Err(err) => store_error_response(err),
    }
}

pub async fn edit_movie(
    store: Data<dyn Store>,
    path: Path<i32>,
    body: Json<MovieEditBody>,
) -> HttpResponse {
    if let Err(error) = body.validate() {
        return validation_error_response(error);
    }
    let movie_id = path.into_inner();
    let body = body.into_inner();
    let update = MovieUpdate {
        title: body.title.map(|title| title.trim().to_string()),
        description: body.description,
        genre_ids: body.genre_ids,
    };
    let query_span = tracing::info_span!("Editing movie", movie_id, ?update);

    match store
        .update_movie(movie_id, &update)
        .instrument(query_span)
        .await
    {
        Ok(movie) => {
            tracing::info!("Movie {} updated", movie.id);
            HttpResponse::Ok().json(json!({
                "data": movie
            }))
        }
        Err(err) => store_error_response(err),
    }
}

pub async fn delete_movie(store: Data<dyn Store>, path: Path<i32>) -> HttpResponse {
    let movie_id = path.into_inner();
    let query_span = tracing::info_span!("Deleting movie", movie_id);

    match store.delete_movie(movie_id).instrument(query_span).await {
        Ok(()) => {
            tracing::info!("Movie {} deleted", movie_id);
            HttpResponse::Ok().json(json!({
                "data": {
                    "movie_id": movie_id
                }
            }))
        }
        Err(err) => store_error_response(err),
    }
}
