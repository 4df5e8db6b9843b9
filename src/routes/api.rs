use crate::handlers;
use actix_web::{web, Scope};

pub fn config() -> Scope {
    web::scope("/api")
        .route("/info", web::get().to(handlers::info))
        .route("/search", web::get().to(handlers::search))
        .route("/search/stream", web::get().to(handlers::search_stream))
        .route("/search/batch", web::post().to(handlers::search_batch))
}

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health_check));
}
