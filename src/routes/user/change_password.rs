use actix_web::{
    web::{Data, Json},
    HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use validator::Validate;

use super::util::{hash_password, validate_password, verify_password};
use crate::store::{AccountStore, Store, StoreError};
use crate::util::{
    current_session, missing_session_response, store_error_response, validation_error_response,
};

#[derive(Deserialize, Validate)]
pub struct PasswordChangeBody {
    pub current_password: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn change_password(
    store: Data<dyn Store>,
    body: Json<PasswordChangeBody>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    if let Err(error) = body.validate() {
        return validation_error_response(error);
    }
    if body.new_password != body.confirm_password {
        return HttpResponse::BadRequest().json(json!({
            "error": "New passwords do not match"
        }));
    }
    let new_hash = match hash_password(&body.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!("Failed to hash password {}", err);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Something went wrong"
            }));
        }
    };
    let query_span = tracing::info_span!("Changing user password", user_id);

    let result = async {
        let (_, password_hash) = store
            .credentials_by_id(user_id)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        if !verify_password(&body.current_password, &password_hash) {
            tracing::error!("Wrong current password");
            return Err(StoreError::Forbidden(
                "Current password is incorrect".to_string(),
            ));
        }
        store.update_password(user_id, &new_hash).await
    }
    .instrument(query_span)
    .await;

    match result {
        Ok(()) => {
            tracing::info!("Password updated");
            HttpResponse::Ok().json(json!({
                "data": "Password updated"
            }))
        }
        Err(err) => store_error_response(err),
    }
}
