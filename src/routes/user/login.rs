use actix_web::{
    web::{Data, Json},
    HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use validator::Validate;

use super::util::{normalize_email, start_session, validate_password, verify_password};
use crate::configuration::ApplicationSettings;
use crate::store::{AccountStore, Store};
use crate::util::{store_error_response, validation_error_response};

#[derive(Deserialize, Validate)]
pub struct UserData {
    #[validate(email(message = "Not a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

pub async fn user_login(
    body: Json<UserData>,
    store: Data<dyn Store>,
    settings: Data<ApplicationSettings>,
) -> HttpResponse {
    if let Err(error) = body.validate() {
        return validation_error_response(error);
    }
    let email = normalize_email(&body.email);
    let query_span = tracing::info_span!("Handle user login", %email);

    let credentials = store
        .credentials_by_email(&email)
        .instrument(query_span.clone())
        .await;
    let (user, password_hash) = match credentials {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            tracing::error!("No user registered with this email");
            return HttpResponse::Unauthorized().json(json!({
                "error": "Invalid email or password"
            }));
        }
        Err(err) => return store_error_response(err),
    };

    if !verify_password(&body.password, &password_hash) {
        tracing::error!("Wrong Password");
        return HttpResponse::Unauthorized().json(json!({
            "error": "Invalid email or password"
        }));
    }
    if user.is_banned {
        tracing::error!("Banned user {} tried to log in", user.id);
        return HttpResponse::Forbidden().json(json!({
            "error": "Your account has been banned"
        }));
    }
    tracing::info!("Password is correct");

    match start_session(store.get_ref(), user, &settings)
        .instrument(query_span)
        .await
    {
        Ok(response) => response,
        Err(err) => store_error_response(err),
    }
}
