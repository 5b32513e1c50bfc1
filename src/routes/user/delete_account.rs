use actix_web::{
    web::{Data, Json},
    HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;

use super::util::{expired_session_cookie, verify_password};
use crate::store::{AccountStore, Store, StoreError};
use crate::util::{current_session, missing_session_response, store_error_response};

#[derive(Deserialize)]
pub struct DeleteAccountBody {
    pub password: String,
}

pub async fn delete_account(
    store: Data<dyn Store>,
    body: Json<DeleteAccountBody>,
    req: HttpRequest,
) -> HttpResponse {
    let user_id = match current_session(&req) {
        Some(session) => session.user.id,
        None => return missing_session_response(),
    };
    let query_span = tracing::info_span!("Deleting own account", user_id);

    let result = async {
        let (_, password_hash) = store
            .credentials_by_id(user_id)
            .await?
            .ok_or(StoreError::NotFound("User"))?;
        if !verify_password(&body.password, &password_hash) {
            tracing::error!("Wrong password on account deletion");
            return Err(StoreError::Forbidden("Password is incorrect".to_string()));
        }
        store.delete_user(user_id).await
    }
    .instrument(query_span)
    .await;

    match result {
        Ok(()) => {
            tracing::info!("User {} deleted their account", user_id);
            HttpResponse::Ok()
                .cookie(expired_session_cookie())
                .json(json!({
                    "data": {
                        "user_id": user_id
                    }
                }))
        }
        Err(err) => store_error_response(err),
    }
}
