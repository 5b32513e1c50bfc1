use std::borrow::Cow;
use std::sync::Arc;

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    web::{self, delete, get, patch, post},
    HttpResponse, Scope,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use regex::Regex;
use serde_json::json;
use uuid::Uuid;
use validator::ValidationError;

use crate::configuration::ApplicationSettings;
use crate::middleware::{Authentication, SESSION_COOKIE};
use crate::models::User;
use crate::store::{AccountStore, Store, StoreError};

use super::{change_password, delete_account, get_user, sign_out_user, user_login, user_signup};

pub fn user_source(store: &Arc<dyn Store>) -> Scope {
    web::scope("/user")
        .route("/sign-up", post().to(user_signup))
        .route("/login", post().to(user_login))
        .route(
            "/sign-out",
            post()
                .to(sign_out_user)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "/password",
            patch()
                .to(change_password)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "",
            get()
                .to(get_user)
                .wrap(Authentication::required(store.clone())),
        )
        .route(
            "",
            delete()
                .to(delete_account)
                .wrap(Authentication::required(store.clone())),
        )
}

const CHECK_FOR_UPPERCASE: &str = ".*[A-Z].*";
const CHECK_FOR_LOWERCASE: &str = ".*[a-z].*";
const CHECK_FOR_NUMBER: &str = ".*[0-9].*";
const CHECK_FOR_SPECIAL_CHARACTER: &str = r".*[^A-Za-z0-9].*";
const FORBIDDEN_CHARACTERS: &[char] = &['/', '(', ')', '"', '<', '>', '\\', '{', '}', '\''];

fn pattern(source: &str) -> Result<Regex, ValidationError> {
    Regex::new(source).map_err(|_| {
        ValidationError::new("Password pattern")
            .with_message(Cow::from("Password could not be checked"))
    })
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        return Err(ValidationError::new("Password length")
            .with_message(Cow::from("Password must be at least 8 characters long")));
    }

    if !pattern(CHECK_FOR_UPPERCASE)?.is_match(password) {
        return Err(
            ValidationError::new("Password missing UpperCase").with_message(Cow::from(
                "Password must contain at least one uppercase letter",
            )),
        );
    }
    if !pattern(CHECK_FOR_LOWERCASE)?.is_match(password) {
        return Err(
            ValidationError::new("Password missing LowerCase").with_message(Cow::from(
                "Password must contain at least one lowercase letter",
            )),
        );
    }
    if !pattern(CHECK_FOR_NUMBER)?.is_match(password) {
        return Err(ValidationError::new("Password missing Number")
            .with_message(Cow::from("Password must contain at least one number")));
    }
    if !pattern(CHECK_FOR_SPECIAL_CHARACTER)?.is_match(password) {
        return Err(
            ValidationError::new("Password missing Special Char").with_message(Cow::from(
                "Password must contain at least one special character",
            )),
        );
    }
    Ok(())
}

pub fn validate_user_name(user_name: &str) -> Result<(), ValidationError> {
    if user_name.len() > 50 {
        return Err(ValidationError::new("User name length error")
            .with_message(Cow::from("User name must be less then 50 characters")));
    }
    if user_name.is_empty() {
        return Err(ValidationError::new("User name length error")
            .with_message(Cow::from("User name can't be empty")));
    }
    if user_name.trim().is_empty() {
        return Err(
            ValidationError::new("User name content error").with_message(Cow::from(
                "User name must contain at least 1 non-whitespace character",
            )),
        );
    }
    if user_name.trim().chars().count() < 3 {
        return Err(ValidationError::new("User name length error")
            .with_message(Cow::from("User name must be at least 3 characters long")));
    }
    if user_name.chars().any(|c| FORBIDDEN_CHARACTERS.contains(&c)) {
        return Err(
            ValidationError::new("User name content error").with_message(Cow::from(
                "User name cannot contain any of the following characters [/, (, ), \", <, >, \\, {, }, ']",
            )),
        );
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(err) => {
            tracing::error!("Stored password hash is unreadable {}", err);
            false
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn session_cookie(session_id: Uuid, ttl_hours: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session_id.to_string())
        .secure(true)
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::hours(ttl_hours))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .secure(true)
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(0))
        .finish()
}

/// Opens a session for `user` and answers with the user and its cookie.
pub async fn start_session(
    store: &dyn Store,
    user: User,
    settings: &ApplicationSettings,
) -> Result<HttpResponse, StoreError> {
    let expires_at = Utc::now() + chrono::Duration::hours(settings.session_ttl_hours);
    let session_id = store.create_session(user.id, expires_at).await?;
    tracing::info!("Session opened for user {}", user.id);
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(session_id, settings.session_ttl_hours))
        .json(json!({
            "data": user
        })))
}
