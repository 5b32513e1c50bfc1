use actix_web::{HttpRequest, HttpResponse};
use serde_json::json;

use crate::util::{current_session, missing_session_response};

pub async fn get_user(req: HttpRequest) -> HttpResponse {
    match current_session(&req) {
        Some(session) => {
            tracing::info!("sending user info");
            HttpResponse::Ok().json(json!({
                "data": session.user
            }))
        }
        None => missing_session_response(),
    }
}
