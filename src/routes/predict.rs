use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{CollegeType, ErrorResponse, HealthResponse, PlacesQuery, PlacesResponse, PredictRequest};
use crate::services::{CollegeSource, SourceError};
use crate::core::{CollegeMatcher, MatchError};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn CollegeSource>,
    pub matcher: CollegeMatcher,
}

/// Configure all prediction-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/predict", web::post().to(predict))
        .route("/chatbot/predict", web::post().to(predict))
        .route("/places", web::get().to(list_places));
}

fn unavailable_response(e: &SourceError) -> HttpResponse {
    let error = match e {
        SourceError::DatabaseMissing(_) => "Database not found",
        _ => "Data source unavailable",
    };

    HttpResponse::ServiceUnavailable().json(ErrorResponse {
        error: error.to_string(),
        message: e.to_string(),
        status_code: 503,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.source.health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Predict colleges endpoint
///
/// POST /api/v1/predict
///
/// Request body (every field optional, rank must be positive):
/// ```json
/// {
///   "exam_type": "PGCET",
///   "state": "Karnataka",
///   "place": "bangalore",
///   "category": "GM",
///   "college_type": "MCA",
///   "rank": 300
/// }
/// ```
async fn predict(
    state: web::Data<AppState>,
    req: web::Json<PredictRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Rejected prediction request with rank {}: {:?}", req.rank, errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Please enter a valid rank".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let query = req.into_inner().into_query();

    tracing::info!(
        "Predicting for {} rank {} (exam_type={}, state={}, category={}, place={:?})",
        query.college_type,
        query.rank,
        query.exam_type,
        query.state,
        query.category,
        query.place
    );

    match state.matcher.predict(state.source.as_ref(), &query).await {
        Ok(outcome) => {
            if outcome.degraded {
                tracing::warn!("Prediction for {} returned empty after a failed lookup", query.college_type);
            }

            tracing::info!(
                "Returning {} exact matches (from {} candidates, {} skipped, fallback: {})",
                outcome.results.exact_matches.len(),
                outcome.candidates,
                outcome.skipped_rows,
                outcome.fallback_used
            );

            HttpResponse::Ok().json(outcome.results)
        }
        Err(MatchError::SourceUnavailable(e)) => {
            tracing::error!("Prediction failed, data source unavailable: {}", e);
            unavailable_response(&e)
        }
    }
}

/// List places for a college type
///
/// GET /api/v1/places?college_type=MCA
async fn list_places(
    state: web::Data<AppState>,
    query: web::Query<PlacesQuery>,
) -> impl Responder {
    let Some(college_type) = CollegeType::parse(&query.college_type) else {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid college type".to_string(),
            message: "college_type must be one of: MCA, MBA, MTECH".to_string(),
            status_code: 400,
        });
    };

    match state.source.table_exists(college_type).await {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Ok().json(PlacesResponse {
                college_type: college_type.to_string(),
                places: vec![],
            });
        }
        Err(e) => {
            tracing::error!("Failed to check {}: {}", college_type.table_name(), e);
            return unavailable_response(&e);
        }
    }

    match state.source.place_counts(college_type).await {
        Ok(places) => HttpResponse::Ok().json(PlacesResponse {
            college_type: college_type.to_string(),
            places,
        }),
        Err(e) => {
            tracing::error!("Failed to list places for {}: {}", college_type.table_name(), e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to list places".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
