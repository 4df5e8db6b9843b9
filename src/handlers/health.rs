use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::models::{ErrorResponse, HealthResponse};
use crate::AppState;

pub async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(
        "<h1>Marketplace Seller API</h1>\
         <p>Use <code>/api/search?query=&lt;keywords&gt;&amp;limit=&lt;n&gt;</code> to search \
         products and resolve seller details for the top results.</p>",
    ))
}

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: state.cache_service.snapshot().await,
    };

    Ok(HttpResponse::Ok().json(response))
}

pub async fn info() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Marketplace Seller API is working",
        "endpoints": {
            "home": "/",
            "health": "/health",
            "info": "/api/info",
            "search": "/api/search?query=<keywords>&limit=<number>",
            "search_stream": "/api/search/stream?query=<keywords>&limit=<number>",
            "search_batch": "/api/search/batch (POST)"
        },
        "example_usage": "/api/search?query=toothpaste&limit=5"
    })))
}

pub async fn not_found() -> Result<HttpResponse> {
    Ok(HttpResponse::NotFound().json(ErrorResponse::new("Endpoint not found")))
}
