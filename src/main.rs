use dotenv::dotenv;
use movie_feedback::configuration::get_configuration;
use movie_feedback::startup;
use movie_feedback::store::PgStore;
use movie_feedback::telemetry::{get_subscriber, init_subscriber};
use movie_feedback::util::check_for_necessary_env;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber("movie_feedback", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let configuration = get_configuration("configuration").map_err(|err| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!(
                "Failed to read `configuration.json`. Please make sure it exists and is valid JSON. {}",
                err
            ),
        )
    })?;
    check_for_necessary_env(&configuration)?;

    let listener = TcpListener::bind(configuration.application.address())?;
    let connection_pool = PgPoolOptions::new()
        .connect(configuration.database.connection_string().as_str())
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let store = PgStore::new(connection_pool);
    store
        .migrate()
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    tracing::info!("Listening on {}", configuration.application.address());

    startup::run_server(listener, Arc::new(store), configuration.application)?.await
}
