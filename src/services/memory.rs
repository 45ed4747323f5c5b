use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::core::filters::parse_cutoff;
use crate::models::{CollegeFilter, CollegeRow, CollegeType, PlaceCount, PlaceMatch};
use crate::services::source::{CollegeSource, SourceError};

/// In-process cutoff tables with the same filter semantics as the SQLite
/// source. Used by tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<CollegeType, Vec<CollegeRow>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, college_type: CollegeType, rows: Vec<CollegeRow>) -> Self {
        self.tables.insert(college_type, rows);
        self
    }
}

#[inline]
fn column_eq(column: &Option<String>, value: &str) -> bool {
    column.as_deref() == Some(value)
}

/// Mirrors `column = ?` / `LOWER(column) = ?`; NULL never compares equal
fn place_matches(place: &Option<String>, filter: &PlaceMatch) -> bool {
    match filter {
        PlaceMatch::Any => true,
        PlaceMatch::Exact(expected) => column_eq(place, expected),
        // SQLite's LOWER only folds ASCII
        PlaceMatch::CaseInsensitive(expected) => place
            .as_deref()
            .map(|p| p.to_ascii_lowercase() == *expected)
            .unwrap_or(false),
    }
}

#[async_trait]
impl CollegeSource for MemorySource {
    async fn table_exists(&self, college_type: CollegeType) -> Result<bool, SourceError> {
        Ok(self.tables.contains_key(&college_type))
    }

    async fn fetch(
        &self,
        college_type: CollegeType,
        filter: &CollegeFilter,
    ) -> Result<Vec<CollegeRow>, SourceError> {
        let rows = self.tables.get(&college_type).ok_or_else(|| {
            SourceError::Query(format!("no such table: {}", college_type.table_name()))
        })?;

        let mut matched: Vec<CollegeRow> = rows
            .iter()
            .filter(|row| column_eq(&row.state, &filter.state))
            .filter(|row| column_eq(&row.exam_type, &filter.exam_type))
            .filter(|row| column_eq(&row.category, &filter.category))
            .filter(|row| place_matches(&row.place, &filter.place))
            .cloned()
            .collect();

        if filter.order_by_opening {
            // NULLs first, like SQLite's ascending order
            matched.sort_by_key(|row| {
                row.opening_cutoff_rank
                    .as_deref()
                    .map(|raw| parse_cutoff(Some(raw)).unwrap_or(0))
            });
        }

        Ok(matched)
    }

    async fn place_counts(&self, college_type: CollegeType) -> Result<Vec<PlaceCount>, SourceError> {
        let Some(rows) = self.tables.get(&college_type) else {
            return Err(SourceError::Query(format!("no such table: {}", college_type.table_name())));
        };

        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for place in rows.iter().filter_map(|row| row.place.as_deref()) {
            if !place.trim().is_empty() {
                *counts.entry(place).or_insert(0) += 1;
            }
        }

        Ok(counts
            .into_iter()
            .map(|(place, college_count)| PlaceCount {
                place: place.to_string(),
                college_count,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<bool, SourceError> {
        Ok(true)
    }
}
