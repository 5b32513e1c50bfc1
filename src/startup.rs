use crate::configuration::ApplicationSettings;
use crate::routes::hello_world::handler;
use crate::routes::{
    admin_source, comment_source, favorite_source, movie_source, stats_source, user_source,
};
use crate::store::Store;

use actix_web::{
    dev::Server,
    web::{self, Data},
    App, HttpServer,
};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use actix_cors::Cors;
use actix_web::http::header;

fn configure_cors(frontend_url: &str) -> Cors {
    let mut cors = Cors::default();
    cors = if frontend_url == "*" {
        cors.allow_any_origin()
    } else {
        cors.allowed_origin(frontend_url)
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT])
        .allowed_header(header::CONTENT_TYPE)
        .max_age(3600)
        .supports_credentials()
}

pub fn run_server(
    listener: TcpListener,
    store: Arc<dyn Store>,
    settings: ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let store_data: Data<dyn Store> = Data::from(store.clone());
    let settings = Data::new(settings);

    let server: Server = HttpServer::new(move || {
        let cors = configure_cors(settings.frontend_url.as_str());
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(store_data.clone())
            .app_data(settings.clone())
            .service(movie_source(&store))
            .service(comment_source(&store))
            .service(favorite_source(&store))
            .service(stats_source(&store))
            .service(user_source(&store))
            .service(admin_source(&store))
            .route("/", web::get().to(handler))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
