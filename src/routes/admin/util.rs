use std::sync::Arc;

use actix_web::{web, Scope};

use crate::middleware::Authentication;
use crate::store::Store;

use super::{
    delete_movie, delete_user_account, edit_movie, list_movies, list_users, set_user_ban,
    set_user_role,
};

/// Rows per page of the admin user and movie listings.
pub const ADMIN_PAGE_SIZE: u32 = 50;

pub fn admin_source(store: &Arc<dyn Store>) -> Scope {
    web::scope("/admin")
        .route(
            "/users",
            web::get()
                .to(list_users)
                .wrap(Authentication::admin(store.clone())),
        )
        .route(
            "/users/{user_id}",
            web::delete()
                .to(delete_user_account)
                .wrap(Authentication::admin(store.clone())),
        )
        .route(
            "/users/{user_id}/ban",
            web::patch()
                .to(set_user_ban)
                .wrap(Authentication::admin(store.clone())),
        )
        .route(
            "/users/{user_id}/role",
            web::patch()
                .to(set_user_role)
                .wrap(Authentication::admin(store.clone())),
        )
        .route(
            "/movies",
            web::get()
                .to(list_movies)
                .wrap(Authentication::admin(store.clone())),
        )
        .route(
            "/movies/{movie_id}",
            web::patch()
                .to(edit_movie)
                .wrap(Authentication::admin(store.clone())),
        )
        .route(
            "/movies/{movie_id}",
            web::delete()
                .to(delete_movie)
                .wrap(Authentication::admin(store.clone())),
        )
}
