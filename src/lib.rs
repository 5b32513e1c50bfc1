pub mod comment_tree;
pub mod configuration;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;
pub mod startup;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod util;
