// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CollegeType, CollegeRow, CollegeRecord, PlaceFilter, PlaceMatch, CollegeFilter, PlaceCount, PredictionQuery, ResultSet};
pub use requests::{PredictRequest, PlacesQuery};
pub use responses::{HealthResponse, ErrorResponse, PlacesResponse};
