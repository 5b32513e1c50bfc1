use std::io;
use std::rc::Rc;

use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::ValidationErrors;

use crate::configuration::Settings;
use crate::models::Session;
use crate::store::StoreError;

#[derive(Serialize, Deserialize, Debug)]
pub struct ResponseMessage {
    pub message: String,
}

impl ResponseMessage {
    pub fn new(message: &str) -> Self {
        ResponseMessage {
            message: message.to_string(),
        }
    }
}

/// Rejects settings the server cannot start with.
pub fn check_for_necessary_env(settings: &Settings) -> io::Result<()> {
    if settings.application.frontend_url.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "application.frontend_url must be set",
        ));
    }
    if settings.application.session_ttl_hours <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "application.session_ttl_hours must be positive",
        ));
    }
    if settings.database.host.trim().is_empty() || settings.database.database_name.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "database.host and database.database_name must be set",
        ));
    }
    Ok(())
}

/// Renders the first field message of a failed validation as a 400.
pub fn validation_error_response(error: ValidationErrors) -> HttpResponse {
    let source = error.field_errors();
    for i in source.iter() {
        for err in i.1.iter() {
            if let Some(message) = err.message.as_ref() {
                tracing::error!("Error: {}", message.as_ref());
                return HttpResponse::BadRequest().json(json!({
                    "error": message.as_ref()
                }));
            }
        }
    }
    HttpResponse::BadRequest().json(json!({
        "error": "Invalid request"
    }))
}

pub fn store_error_response(err: StoreError) -> HttpResponse {
    match err {
        StoreError::NotFound(_) => {
            tracing::info!("{}", err);
            HttpResponse::NotFound().json(json!({ "error": err.to_string() }))
        }
        StoreError::Forbidden(reason) => {
            tracing::error!("Forbidden: {}", reason);
            HttpResponse::Forbidden().json(json!({ "error": reason }))
        }
        StoreError::Conflict(reason) => {
            tracing::error!("Conflict: {}", reason);
            HttpResponse::Conflict().json(json!({ "error": reason }))
        }
        StoreError::InvalidInput(reason) => {
            tracing::error!("Invalid input: {}", reason);
            HttpResponse::BadRequest().json(json!({ "error": reason }))
        }
        StoreError::Database(_) | StoreError::Migration(_) => {
            tracing::error!("Database error {:#?}", err);
            HttpResponse::InternalServerError().json(json!({
                "error": "Something went wrong"
            }))
        }
    }
}

/// The session the authentication middleware attached to `req`, if any.
pub fn current_session(req: &HttpRequest) -> Option<Rc<Session>> {
    req.extensions().get::<Rc<Session>>().cloned()
}

pub fn missing_session_response() -> HttpResponse {
    tracing::info!("User field not found in req object");
    HttpResponse::Unauthorized().json(json!({
        "error": "Authentication required"
    }))
}
