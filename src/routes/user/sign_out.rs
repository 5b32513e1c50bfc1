use actix_web::{web::Data, HttpRequest, HttpResponse};
use tracing::Instrument;

use super::util::expired_session_cookie;
use crate::store::{AccountStore, Store};
use crate::util::{current_session, missing_session_response, store_error_response};

pub async fn sign_out_user(store: Data<dyn Store>, req: HttpRequest) -> HttpResponse {
    let session_id = match current_session(&req) {
        Some(session) => session.id,
        None => return missing_session_response(),
    };
    let query_span = tracing::info_span!("User sign-out event", %session_id);

    match store
        .delete_session(session_id)
        .instrument(query_span)
        .await
    {
        Ok(()) => {
            tracing::info!("session cleared successfully");
            HttpResponse::Ok().cookie(expired_session_cookie()).finish()
        }
        Err(err) => store_error_response(err),
    }
}
