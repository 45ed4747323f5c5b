use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CollegeFilter, CollegeRow, CollegeType, PlaceCount};

/// Errors that can occur when reading cutoff tables
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database not found: {0}")]
    DatabaseMissing(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// Read-only access to the per-college-type cutoff tables
#[async_trait]
pub trait CollegeSource: Send + Sync {
    /// Whether the table for this college type has been loaded
    async fn table_exists(&self, college_type: CollegeType) -> Result<bool, SourceError>;

    /// Rows matching every equality filter, in storage order unless
    /// `order_by_opening` is set
    async fn fetch(
        &self,
        college_type: CollegeType,
        filter: &CollegeFilter,
    ) -> Result<Vec<CollegeRow>, SourceError>;

    /// Distinct non-blank places with row counts, ordered by place
    async fn place_counts(&self, college_type: CollegeType) -> Result<Vec<PlaceCount>, SourceError>;

    async fn health_check(&self) -> Result<bool, SourceError>;
}
