//! College Predictor - rank-based college prediction service
//!
//! Given an exam rank, category, exam type and preferred location, finds the
//! colleges whose published cutoff window contains that rank. Place input is
//! normalized against a table of known spellings before the lookup, with a
//! case-insensitive retry when the exact place finds nothing.

pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{CollegeMatcher, MatchOutcome, MatchError, PlaceNormalizer};
pub use models::{CollegeType, CollegeRecord, PredictionQuery, PredictRequest, ResultSet};
pub use services::{CollegeSource, MemorySource, SqliteSource};
