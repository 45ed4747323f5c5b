use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use college_predictor::config::Settings;
use college_predictor::core::{CollegeMatcher, PlaceNormalizer};
use college_predictor::routes::{self, predict::AppState};
use college_predictor::services::{CollegeSource, SqliteSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    college_predictor::logging::init(&settings.logging);

    info!("Starting College Predictor service...");

    let max_connections = settings.database.max_connections.unwrap_or(8);
    let acquire_timeout = Duration::from_secs(settings.database.acquire_timeout_secs.unwrap_or(5));

    let source: Arc<dyn CollegeSource> = Arc::new(SqliteSource::open_read_only(
        &settings.database.path,
        max_connections,
        acquire_timeout,
    ));

    match source.health_check().await {
        Ok(true) => info!("Database reachable at {}", settings.database.path),
        Ok(false) | Err(_) => error!(
            "Database at {} is not readable yet; predictions will report it until it is loaded",
            settings.database.path
        ),
    }

    let normalizer = PlaceNormalizer::new().with_aliases(settings.matching.place_aliases.clone());
    let matcher = CollegeMatcher::new(normalizer).order_by_opening(settings.matching.order_by_opening_rank);

    info!(
        "Matcher initialized ({} extra place aliases, order by opening rank: {})",
        settings.matching.place_aliases.len(),
        settings.matching.order_by_opening_rank
    );

    // Build application state
    let app_state = AppState { source, matcher };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
