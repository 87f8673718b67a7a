// API route configuration

use crate::api::{auth::CronAuth, handlers, models::ApiError};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Unparseable ids and query strings answer with the JSON error body
        .app_data(
            web::PathConfig::default()
                .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
        )
        .app_data(
            web::QueryConfig::default()
                .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
        )
        // Health check
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                // Scheduled collection (shared secret required)
                .service(
                    web::scope("/cron").wrap(CronAuth).service(
                        web::resource("/collect-data")
                            .route(web::get().to(handlers::collect_data))
                            .route(web::post().to(handlers::collect_data)),
                    ),
                )
                // Read-only catalog
                .route("/games", web::get().to(handlers::list_games))
                .route("/games/{id}", web::get().to(handlers::get_game))
                .route(
                    "/games/{id}/similar",
                    web::get().to(handlers::similar_games),
                )
                .route("/tags", web::get().to(handlers::list_tags))
                .route("/cache", web::get().to(handlers::cache_status)),
        );
}
