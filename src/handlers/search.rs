use actix_web::{web, HttpResponse, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;
use validator::Validate;

use crate::errors::PipelineError;
use crate::models::{
    BatchSearchRequest, BatchSearchResult, ErrorResponse, ResultRecord, SearchParams, SearchQuery,
    MIN_LIMIT,
};
use crate::AppState;

pub fn error_response(err: &PipelineError) -> HttpResponse {
    match err {
        PipelineError::InvalidRequest(reason) => HttpResponse::BadRequest()
            .json(ErrorResponse::with_details("Invalid request", reason.clone())),
        PipelineError::SearchUnavailable(fetch) if fetch.is_timeout() => {
            HttpResponse::GatewayTimeout().json(ErrorResponse::with_details(
                "Marketplace search timed out",
                fetch.to_string(),
            ))
        }
        PipelineError::SearchUnavailable(fetch) => HttpResponse::BadGateway().json(
            ErrorResponse::with_details("Marketplace search unavailable", fetch.to_string()),
        ),
    }
}

pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let query = match SearchQuery::from_params(params.query.as_deref(), params.limit.as_deref()) {
        Ok(query) => query,
        Err(e) => return Ok(error_response(&e)),
    };

    if let Some(cached) = state.cache_service.get(&query).await {
        return Ok(HttpResponse::Ok()
            .insert_header(("X-Cache", "hit"))
            .json(cached));
    }

    match state.extraction.search(&query).await {
        Ok(records) => {
            state.cache_service.set(&query, &records).await;
            Ok(HttpResponse::Ok()
                .insert_header(("X-Cache", "miss"))
                .json(records))
        }
        Err(e) => {
            tracing::error!("Search error: {}", e);
            Ok(error_response(&e))
        }
    }
}

pub async fn search_stream(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let query = match SearchQuery::from_params(params.query.as_deref(), params.limit.as_deref()) {
        Ok(query) => query,
        Err(e) => return Ok(error_response(&e)),
    };

    let span = state.extraction.pipeline_span(&query);
    let stubs = match state
        .extraction
        .find_stubs(&query)
        .instrument(span.clone())
        .await
    {
        Ok(stubs) => stubs,
        Err(e) => {
            tracing::error!("Search stream error: {}", e);
            return Ok(error_response(&e));
        }
    };

    let (tx, rx) = mpsc::channel::<ResultRecord>(16);
    let extraction = state.extraction.clone();
    tokio::spawn(
        async move {
            let sent = extraction.stream_enriched(stubs, tx).await;
            tracing::info!(results = sent, "search stream completed");
        }
        .instrument(span),
    );

    let stream = ReceiverStream::new(rx).map(|record| {
        serde_json::to_vec(&record)
            .map(|mut line| {
                line.push(b'\n');
                Bytes::from(line)
            })
            .map_err(std::io::Error::from)
    });

    Ok(HttpResponse::Ok()
        .insert_header((actix_web::http::header::CONTENT_TYPE, "application/x-ndjson"))
        .streaming(stream))
}

pub async fn search_batch(
    state: web::Data<AppState>,
    req: web::Json<BatchSearchRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::with_details(
            "Invalid request",
            format!("Validation error: {}", e),
        )));
    }

    let max_queries = state.config.security.max_batch_queries;
    if req.queries.len() > max_queries {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::with_details(
            "Invalid request",
            format!("at most {} queries are allowed per batch", max_queries),
        )));
    }
    if let Some(limit) = req.limit.filter(|limit| *limit < MIN_LIMIT) {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::with_details(
            "Invalid request",
            format!("limit must be at least {}, got {}", MIN_LIMIT, limit),
        )));
    }

    let mut results = Vec::with_capacity(req.queries.len());
    for keyword in &req.queries {
        let outcome = match SearchQuery::new(keyword, req.limit) {
            Ok(query) => state.extraction.search(&query).await,
            Err(e) => Err(e),
        };

        results.push(match outcome {
            Ok(records) => BatchSearchResult {
                query: keyword.clone(),
                results: records,
                error: None,
            },
            Err(e) => {
                tracing::warn!(query = %keyword, error = %e, "batch query failed");
                BatchSearchResult {
                    query: keyword.clone(),
                    results: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        });
    }

    Ok(HttpResponse::Ok().json(results))
}
