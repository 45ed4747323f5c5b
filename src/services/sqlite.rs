use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::models::{CollegeFilter, CollegeRow, CollegeType, PlaceCount, PlaceMatch};
use crate::services::loader::TABLE_COLUMNS;
use crate::services::source::{CollegeSource, SourceError};

/// Columns a table may lack; they are read back as NULL.
/// Every other column in `TABLE_COLUMNS` must be present.
const OPTIONAL_COLUMNS: [&str; 5] = ["serial_no", "seats", "year", "website", "background_images"];

/// Build the column list for a table holding `available` columns.
///
/// Every column comes back as TEXT; cutoff parsing happens in the matcher.
fn build_projection(available: &HashSet<String>) -> Result<String, String> {
    let mut columns = Vec::with_capacity(TABLE_COLUMNS.len());

    for column in TABLE_COLUMNS {
        if available.contains(column) {
            columns.push(format!("CAST({0} AS TEXT) AS {0}", column));
        } else if OPTIONAL_COLUMNS.contains(&column) {
            columns.push(format!("NULL AS {}", column));
        } else {
            return Err(format!("missing required column {}", column));
        }
    }

    Ok(columns.join(", "))
}

/// SQLite-backed cutoff tables
///
/// The pool is opened read-only and lazily, so a missing or unreadable
/// database file shows up per request instead of aborting startup.
pub struct SqliteSource {
    pool: SqlitePool,
    path: Option<PathBuf>,
    projections: RwLock<HashMap<CollegeType, String>>,
}

impl SqliteSource {
    /// Open a read-only pool over the database file at `path`
    pub fn open_read_only<P: AsRef<Path>>(
        path: P,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Self {
        let path = path.as_ref().to_path_buf();

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options);

        tracing::info!("SQLite source configured at {} (max: {} connections)", path.display(), max_connections);

        Self { pool, path: Some(path), projections: RwLock::new(HashMap::new()) }
    }

    /// Wrap an existing pool (no file existence check is made)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool, path: None, projections: RwLock::new(HashMap::new()) }
    }

    async fn ensure_database_file(&self) -> Result<(), SourceError> {
        if let Some(path) = &self.path {
            let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
            if !exists {
                return Err(SourceError::DatabaseMissing(path.display().to_string()));
            }
        }
        Ok(())
    }

    /// Column list for `college_type`, read from the table schema on first use
    async fn projection(&self, college_type: CollegeType) -> Result<String, SourceError> {
        if let Some(projection) = self.projections.read().await.get(&college_type) {
            return Ok(projection.clone());
        }

        let table = college_type.table_name();
        let names: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SourceError::Query(format!("{}: {}", table, e)))?;

        let available: HashSet<String> = names.into_iter().map(|(name,)| name.to_lowercase()).collect();
        let projection = build_projection(&available)
            .map_err(|e| SourceError::Query(format!("{}: {}", table, e)))?;

        let missing: Vec<&str> = OPTIONAL_COLUMNS
            .iter()
            .copied()
            .filter(|column| !available.contains(*column))
            .collect();
        if !missing.is_empty() {
            tracing::info!("{} has no {} column(s); reading them as empty", table, missing.join(", "));
        }

        self.projections.write().await.insert(college_type, projection.clone());
        Ok(projection)
    }
}

/// Build the lookup statement. The table name comes from the fixed
/// `CollegeType` set only; every user value is a bound parameter.
fn build_select(table: &str, projection: &str, filter: &CollegeFilter) -> String {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE state = ? AND exam_type = ? AND category = ?",
        projection, table
    );

    match filter.place {
        PlaceMatch::Any => {}
        PlaceMatch::Exact(_) => sql.push_str(" AND place = ?"),
        PlaceMatch::CaseInsensitive(_) => sql.push_str(" AND LOWER(place) = ?"),
    }

    if filter.order_by_opening {
        sql.push_str(" ORDER BY CAST(opening_cutoff_rank AS INTEGER)");
    }

    sql
}

#[async_trait]
impl CollegeSource for SqliteSource {
    async fn table_exists(&self, college_type: CollegeType) -> Result<bool, SourceError> {
        self.ensure_database_file().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(college_type.table_name())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn fetch(
        &self,
        college_type: CollegeType,
        filter: &CollegeFilter,
    ) -> Result<Vec<CollegeRow>, SourceError> {
        let table = college_type.table_name();
        let projection = self.projection(college_type).await?;
        let sql = build_select(table, &projection, filter);

        tracing::debug!("Executing query on {}: {}", table, sql);

        let mut query = sqlx::query_as::<_, CollegeRow>(&sql)
            .bind(&filter.state)
            .bind(&filter.exam_type)
            .bind(&filter.category);

        match &filter.place {
            PlaceMatch::Any => {}
            PlaceMatch::Exact(place) | PlaceMatch::CaseInsensitive(place) => {
                query = query.bind(place);
            }
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SourceError::Query(format!("{}: {}", table, e)))
    }

    async fn place_counts(&self, college_type: CollegeType) -> Result<Vec<PlaceCount>, SourceError> {
        let sql = format!(
            "SELECT CAST(place AS TEXT) AS place, COUNT(*) AS college_count \
             FROM {} \
             WHERE place IS NOT NULL AND TRIM(place) != '' \
             GROUP BY place \
             ORDER BY place",
            college_type.table_name()
        );

        let counts = sqlx::query_as::<_, PlaceCount>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(counts)
    }

    async fn health_check(&self) -> Result<bool, SourceError> {
        self.ensure_database_file().await?;

        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
