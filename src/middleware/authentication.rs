use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};

use chrono::Utc;
use futures_util::{future::LocalBoxFuture, FutureExt};

use serde_json::json;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::store::Store;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Anonymous requests pass through without a session.
    Optional,
    Required,
    /// Required, and the user must be an admin.
    Admin,
}

/// Resolves the `session` cookie and stores the `Rc<Session>` in the request
/// extensions.
pub struct Authentication {
    store: Arc<dyn Store>,
    mode: AuthMode,
}

impl Authentication {
    pub fn required(store: Arc<dyn Store>) -> Self {
        Authentication {
            store,
            mode: AuthMode::Required,
        }
    }

    pub fn optional(store: Arc<dyn Store>) -> Self {
        Authentication {
            store,
            mode: AuthMode::Optional,
        }
    }

    pub fn admin(store: Arc<dyn Store>) -> Self {
        Authentication {
            store,
            mode: AuthMode::Admin,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddleware {
            service: Rc::new(service),
            store: self.store.clone(),
            mode: self.mode,
        }))
    }
}

pub struct AuthenticationMiddleware<S> {
    service: Rc<S>,
    store: Arc<dyn Store>,
    mode: AuthMode,
}

fn reject<B>(
    req: ServiceRequest,
    http_res: HttpResponse,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let (http_req, _) = req.into_parts();
    let response = ServiceResponse::new(http_req, http_res);
    Ok(response.map_into_right_body())
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Error = Error;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let query_span = tracing::info_span!("Authentication middleware", mode = ?self.mode);
        let cookie_value = req
            .cookie(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string());
        let store = self.store.clone();
        let service = self.service.clone();
        let mode = self.mode;

        async move {
            let session_id = match cookie_value.as_deref().map(Uuid::parse_str) {
                Some(Ok(id)) => Some(id),
                Some(Err(_)) => {
                    tracing::error!("Invalid Cookie value");
                    None
                }
                None => None,
            };

            let session = match session_id {
                Some(id) => match store.session(id).await {
                    Ok(Some(session)) if session.expires_at < Utc::now() => {
                        tracing::info!("Session expired");
                        if let Err(err) = store.delete_session(id).await {
                            tracing::error!("Database error {}", err);
                            return reject(
                                req,
                                HttpResponse::InternalServerError().json(json!({
                                    "error": "Something went wrong"
                                })),
                            );
                        }
                        None
                    }
                    Ok(session) => session,
                    Err(err) => {
                        tracing::error!("Database error {}", err);
                        return reject(
                            req,
                            HttpResponse::InternalServerError().json(json!({
                                "error": "Something went wrong"
                            })),
                        );
                    }
                },
                None => None,
            };

            let session = match (session, mode) {
                (Some(session), AuthMode::Optional) if session.user.is_banned => None,
                (None, AuthMode::Optional) => None,
                (None, _) => {
                    tracing::error!("No valid session in request");
                    return reject(
                        req,
                        HttpResponse::Unauthorized().json(json!({
                            "error": "Authentication required"
                        })),
                    );
                }
                (Some(session), _) if session.user.is_banned => {
                    tracing::error!("Banned user {} rejected", session.user.id);
                    return reject(
                        req,
                        HttpResponse::Forbidden().json(json!({
                            "error": "Your account has been banned"
                        })),
                    );
                }
                (Some(session), AuthMode::Admin) if !session.user.is_admin() => {
                    tracing::error!("User {} is not an admin", session.user.id);
                    return reject(
                        req,
                        HttpResponse::Forbidden().json(json!({
                            "error": "Admin access required"
                        })),
                    );
                }
                (Some(session), _) => Some(session),
            };

            if let Some(session) = session {
                tracing::info!("Found session for user {}", session.user.id);
                req.extensions_mut().insert(Rc::new(session));
            }
            let res: ServiceResponse<B> = service.call(req).await?;
            Ok(res.map_into_left_body())
        }
        .instrument(query_span)
        .boxed_local()
    }
}
