use std::sync::Arc;

use actix_web::{web, Scope};

use crate::middleware::Authentication;
use crate::store::Store;

use super::{get_favorite_movies, remove_favorite_movie};

pub fn favorite_source(store: &Arc<dyn Store>) -> Scope {
    web::scope("/favorites")
        .route(
            "",
            web::get()
                .to(get_favorite_movies)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/{movie_id}",
            web::delete()
                .to(remove_favorite_movie)
                .wrap(Authentication::required(store.clone())),
        )
}
