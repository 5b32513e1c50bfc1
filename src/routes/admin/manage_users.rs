use actix_web::{
    web::{Data, Json, Path, Query},
    HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;

use super::ADMIN_PAGE_SIZE;
use crate::models::Role;
use crate::search::{clamp_page, pages_for, search_text, PageWindow};
use crate::store::{AccountStore, AdminStore, Store, StoreError};
use crate::util::{current_session, missing_session_response, store_error_response};

#[derive(Deserialize, Debug)]
pub struct BanBody {
    pub banned: bool,
}

#[derive(Deserialize, Debug)]
pub struct RoleBody {
    pub role: Role,
}

#[derive(Deserialize, Debug, Default)]
pub struct UserListQuery {
    pub query: Option<String>,
    pub page: Option<i64>,
}

pub async fn list_users(store: Data<dyn Store>, info: Query<UserListQuery>) -> HttpResponse {
    let username = search_text(info.query.as_deref());
    let page = clamp_page(info.page);
    let query_span = tracing::info_span!("Listing users", ?username, page);

    let result = async {
        let total = store.count_users(username.as_deref()).await?;
        let users = store
            .list_users(
                username.as_deref(),
                PageWindow::sized(page, ADMIN_PAGE_SIZE),
            )
            .await?;
        Ok::<_, StoreError>((total, users))
    }
    .instrument(query_span)
    .await;

    match result {
        Ok((total, users)) => HttpResponse::Ok().json(json!({
            "data": {
                "users": users,
                "total_users": total,
                "current_page": page,
                "total_pages": pages_for(total, ADMIN_PAGE_SIZE),
                "page_size": ADMIN_PAGE_SIZE,
                "query": username
            }
        })),
        Err(err) => store_error_response(err),
    }
}

pub async fn set_user_role(
    store: Data<dyn Store>,
    path: Path<i32>,
    body: Json<RoleBody>,
    req: HttpRequest,
) -> HttpResponse {
    let admin_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let user_id = path.into_inner();
    if user_id == admin_id {
        tracing::error!("Admin {} tried to change their own role", admin_id);
        return HttpResponse::BadRequest().json(json!({
            "error": "You cannot change your own role"
        }));
    }
    let query_span = tracing::info_span!("Updating user role", user_id, role = ?body.role);

    match store
        .set_role(user_id, body.role)
        .instrument(query_span)
        .await
    {
        Ok(user) => {
            tracing::info!("User {} role set to {:?}", user.id, user.role);
            HttpResponse::Ok().json(json!({
                "data": user
            }))
        }
        Err(err) => store_error_response(err),
    }
}

pub async fn delete_user_account(
    store: Data<dyn Store>,
    path: Path<i32>,
    req: HttpRequest,
) -> HttpResponse {
    let admin_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let user_id = path.into_inner();
    if user_id == admin_id {
        tracing::error!("Admin {} tried to delete themselves", admin_id);
        return HttpResponse::BadRequest().json(json!({
            "error": "You cannot delete yourself"
        }));
    }
    let query_span = tracing::info_span!("Deleting user", user_id);

    match store.delete_user(user_id).instrument(query_span).await {
        Ok(()) => {
            tracing::info!("User {} deleted by admin {}", user_id, admin_id);
            HttpResponse::Ok().json(json!({
                "data": {
                    "user_id": user_id
                }
            }))
        }
        Err(err) => store_error_response(err),
    }
}

pub async fn set_user_ban(
    store: Data<dyn Store>,
    path: Path<i32>,
    body: Json<BanBody>,
    req: HttpRequest,
) -> HttpResponse {
    let admin_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let user_id = path.into_inner();
    if user_id == admin_id && body.banned {
        tracing::error!("Admin {} tried to ban themselves", admin_id);
        return HttpResponse::BadRequest().json(json!({
            "error": "You cannot ban yourself"
        }));
    }
    let query_span = tracing::info_span!("Updating user ban", user_id, banned = body.banned);

    match store
        .set_banned(user_id, body.banned)
        .instrument(query_span)
        .await
    {
        Ok(user) => {
            tracing::info!("User {} ban flag set to {}", user.id, user.is_banned);
            HttpResponse::Ok().json(json!({
                "data": user
            }))
        }
        Err(err) => store_error_response(err),
    }
}
