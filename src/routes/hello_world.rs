use crate::util::ResponseMessage;
use actix_web::HttpResponse;

pub async fn handler() -> HttpResponse {
    tracing::info!("Health check");
    HttpResponse::Ok().json(ResponseMessage::new("Movie feedback service is up"))
}
