use actix_web::{
    web::{Data, Json},
    HttpResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use validator::Validate;

use super::util::{hash_password, normalize_email, start_session, validate_password, validate_user_name};
use crate::configuration::ApplicationSettings;
use crate::models::NewUser;
use crate::store::{AccountStore, Store};
use crate::util::{store_error_response, validation_error_response};

#[derive(Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_user_name"))]
    username: String,
    #[validate(email(message = "Not a valid email"))]
    email: String,
    #[validate(custom(function = "validate_password"))]
    password: String,
}

pub async fn user_signup(
    body: Json<CreateUserRequest>,
    store: Data<dyn Store>,
    settings: Data<ApplicationSettings>,
) -> HttpResponse {
    if let Err(error) = body.validate() {
        return validation_error_response(error);
    }
    let password_hash = match hash_password(&body.password) {
        Ok(hash) => {
            tracing::info!("Password hashed successfully");
            hash
        }
        Err(err) => {
            tracing::error!("Failed to hash password {}", err);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Something went wrong"
            }));
        }
    };
    let new_user = NewUser {
        username: body.username.trim().to_string(),
        email: normalize_email(&body.email),
        password_hash,
    };
    let query_span = tracing::info_span!(
        "Saving new user details",
        username = %new_user.username,
        email = %new_user.email
    );

    let result = async {
        let user = store.create_user(new_user).await?;
        tracing::info!("User created successfully");
        start_session(store.get_ref(), user, &settings).await
    }
    .instrument(query_span)
    .await;

    match result {
        Ok(response) => response,
        Err(err) => store_error_response(err),
    }
}
