use std::sync::Arc;

use actix_web::{web, Scope};

use crate::middleware::Authentication;
use crate::routes::post_comment;
use crate::store::Store;

use super::{get_movie_details, get_movies_search, get_popular_movies, rate_movie, toggle_favorite};

pub fn movie_source(store: &Arc<dyn Store>) -> Scope {
    web::scope("/movies")
        .route("/popular", web::get().to(get_popular_movies))
        .route(
            "/search",
            web::get()
                .to(get_movies_search)
                .wrap(Authentication::optional(store.clone())),
        )
        .route(
            "/{movie_id}",
            web::get()
                .to(get_movie_details)
                .wrap(Authentication::optional(store.clone())),
        )
        .route(
            "/{movie_id}/rating",
            web::post()
                .to(rate_movie)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/{movie_id}/favorite",
            web::post()
                .to(toggle_favorite)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/{movie_id}/comments",
            web::post()
                .to(post_comment)
                .wrap(Authentication::required(store.clone())),
        )
}
