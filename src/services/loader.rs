use csv::{ReaderBuilder, Trim};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::models::CollegeType;

/// Columns of every cutoff table, in storage order
pub const TABLE_COLUMNS: [&str; 14] = [
    "serial_no",
    "college_id",
    "college_name",
    "college_type",
    "state",
    "place",
    "exam_type",
    "category",
    "opening_cutoff_rank",
    "closing_cutoff_rank",
    "seats",
    "year",
    "website",
    "background_images",
];

const REQUIRED_COLUMNS: [&str; 2] = ["opening_cutoff_rank", "closing_cutoff_rank"];

/// Errors that can occur while importing cutoff data
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("CSV parsing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Outcome of one import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: &'static str,
    pub rows_read: usize,
    pub rows_written: u64,
}

/// Offline importer from per-program CSV exports into the cutoff tables
///
/// Opens the database read-write; the serving path never uses this.
pub struct CsvLoader {
    pool: SqlitePool,
}

impl CsvLoader {
    /// Open (creating if needed) the database file at `path`
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the table for `college_type` if it does not exist yet
    pub async fn ensure_table(&self, college_type: CollegeType) -> Result<(), LoadError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                serial_no INTEGER,
                college_id TEXT,
                college_name TEXT,
                college_type TEXT,
                state TEXT,
                place TEXT,
                exam_type TEXT,
                category TEXT,
                opening_cutoff_rank INTEGER,
                closing_cutoff_rank INTEGER,
                seats INTEGER,
                year INTEGER,
                website TEXT,
                background_images TEXT,
                PRIMARY KEY (college_id, category, year)
            )",
            college_type.table_name()
        );

        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Import the CSV file at `path`; parsing runs on the blocking pool
    pub async fn load_file(&self, college_type: CollegeType, path: &Path) -> Result<LoadSummary, LoadError> {
        let bytes = tokio::fs::read(path).await?;
        let records = tokio::task::spawn_blocking(move || read_records(bytes.as_slice())).await??;
        self.write_records(college_type, records).await
    }

    /// Import CSV from an in-memory reader
    pub async fn load_reader<R: Read>(
        &self,
        college_type: CollegeType,
        reader: R,
    ) -> Result<LoadSummary, LoadError> {
        let records = read_records(reader)?;
        self.write_records(college_type, records).await
    }

    /// Upsert every record into the table for `college_type`.
    ///
    /// Cells are bound as text and stored through column affinity, so a
    /// numeric cutoff lands as INTEGER while `"N/A"` stays as text and is
    /// skipped at match time. Empty cells become NULL.
    async fn write_records(
        &self,
        college_type: CollegeType,
        records: Vec<Vec<Option<String>>>,
    ) -> Result<LoadSummary, LoadError> {
        let table = college_type.table_name();

        self.ensure_table(college_type).await?;

        let placeholders = vec!["?"; TABLE_COLUMNS.len()].join(", ");
        let insert = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            table,
            TABLE_COLUMNS.join(", "),
            placeholders
        );

        let mut tx = self.pool.begin().await?;
        let mut rows_written = 0;

        for record in &records {
            let mut query = sqlx::query(&insert);
            for cell in record {
                query = query.bind(cell.as_deref());
            }
            rows_written += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        tracing::info!("Loaded {} records into {}", records.len(), table);

        Ok(LoadSummary {
            table,
            rows_read: records.len(),
            rows_written,
        })
    }

    /// Row count per cutoff table, `None` where the table is absent
    pub async fn table_counts(&self) -> Result<Vec<(CollegeType, Option<i64>)>, LoadError> {
        let mut counts = Vec::with_capacity(CollegeType::ALL.len());

        for college_type in CollegeType::ALL {
            let exists: Option<(String,)> =
                sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                    .bind(college_type.table_name())
                    .fetch_optional(&self.pool)
                    .await?;

            let count = match exists {
                Some(_) => {
                    let sql = format!("SELECT COUNT(*) FROM {}", college_type.table_name());
                    let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
                    Some(count)
                }
                None => None,
            };
            counts.push((college_type, count));
        }

        Ok(counts)
    }
}

/// Parse CSV into rows aligned with `TABLE_COLUMNS`
fn read_records<R: Read>(reader: R) -> Result<Vec<Vec<Option<String>>>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let positions: Vec<Option<usize>> = TABLE_COLUMNS
        .iter()
        .map(|column| headers.iter().position(|h| h.trim() == *column))
        .collect();

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == required) {
            return Err(LoadError::MissingColumn(required.to_string()));
        }
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = positions
            .iter()
            .map(|&position| {
                position
                    .and_then(|index| record.get(index))
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
            .collect();
        records.push(row);
    }

    Ok(records)
}
