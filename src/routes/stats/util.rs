use std::sync::Arc;

use actix_web::{web, Scope};

use crate::middleware::Authentication;
use crate::store::Store;

use super::{
    get_activity_level, get_average_rating, get_favorites_history, get_ratings_history,
    get_recent_ratings, get_stats_summary,
};

pub fn stats_source(store: &Arc<dyn Store>) -> Scope {
    web::scope("/stats")
        .route(
            "/summary",
            web::get()
                .to(get_stats_summary)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/ratings",
            web::get()
                .to(get_ratings_history)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/favorites",
            web::get()
                .to(get_favorites_history)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/activity",
            web::get()
                .to(get_activity_level)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/average",
            web::get()
                .to(get_average_rating)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/recent",
            web::get()
                .to(get_recent_ratings)
                .wrap(Authentication::required(store.clone())),
        )
}
