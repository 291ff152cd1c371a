use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{RankOptions, RecommendError, Recommender};
use crate::models::{DefaultRecommendationQuery, ErrorResponse, FilterParams, HealthResponse, ScoringWeights};
use crate::services::CandidateStore;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CandidateStore>,
    pub recommender: Recommender,
}

/// Configure all discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/discover/getDefaultRecommendation", web::get().to(default_recommendation))
        .route("/discover/getFilteredRecommendation", web::get().to(filtered_recommendation));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Default recommendation endpoint
///
/// GET /api/v1/discover/getDefaultRecommendation?userId=1&alpha=0.6&beta=0.4&topKApi=50&finalTopK=20
///
/// Everything but `userId` is optional.
async fn default_recommendation(
    state: web::Data<AppState>,
    query: web::Query<DefaultRecommendationQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let options = RankOptions {
        weights: weights_override(state.recommender.weights(), query.alpha, query.beta),
        top_k_api: query.top_k_api,
        final_top_k: query.final_top_k,
    };

    tracing::info!("Default recommendation for user: {}", query.user_id);

    match state.recommender.rank(query.user_id, options).await {
        Ok(profiles) => HttpResponse::Ok().json(profiles),
        Err(e) => error_response(query.user_id, e),
    }
}

/// Filtered recommendation endpoint
///
/// GET /api/v1/discover/getFilteredRecommendation?userId=1&interests=Кино&interests=Музыка&minAge=20&maxAge=35&city=Berlin&country=Germany&languages=Deutsch
///
/// `interests` and `languages` may repeat.
async fn filtered_recommendation(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> impl Responder {
    let pairs = query.into_inner();

    let user_id = match parse_user_id(&pairs) {
        Some(id) => id,
        None => {
            return bad_request(
                "Missing userId parameter",
                "userId query parameter must be a positive integer".to_string(),
            );
        }
    };

    let params = FilterParams::from_pairs(pairs);

    tracing::info!("Filtered recommendation for user: {}, filters: {:?}", user_id, params);

    match state.recommender.rank_filtered(user_id, &params).await {
        Ok(profiles) => HttpResponse::Ok().json(profiles),
        Err(e) => error_response(user_id, e),
    }
}

fn parse_user_id(pairs: &[(String, String)]) -> Option<i32> {
    pairs
        .iter()
        .find(|(key, _)| key == "userId")
        .and_then(|(_, value)| value.parse::<i32>().ok())
        .filter(|id| *id > 0)
}

/// Request weights replace the configured ones field by field
fn weights_override(
    configured: ScoringWeights,
    alpha: Option<f64>,
    beta: Option<f64>,
) -> Option<ScoringWeights> {
    if alpha.is_none() && beta.is_none() {
        return None;
    }
    Some(ScoringWeights::new(
        alpha.unwrap_or(configured.tag_match),
        beta.unwrap_or(configured.similarity),
    ))
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

fn error_response(user_id: i32, err: RecommendError) -> HttpResponse {
    match err {
        RecommendError::InvalidWeights { .. } => bad_request("Invalid weights", err.to_string()),
        RecommendError::StoreUnavailable(_) => {
            tracing::error!("Failed to build recommendations for {}: {}", user_id, err);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to build recommendations".to_string(),
                message: err.to_string(),
                status_code: 500,
            })
        }
    }
}
