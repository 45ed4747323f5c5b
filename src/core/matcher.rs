use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::filters::{to_record, CutoffWindow, RowRejection};
use crate::core::place::PlaceNormalizer;
use crate::models::{CollegeFilter, CollegeRow, CollegeType, PlaceFilter, PlaceMatch, PredictionQuery, ResultSet};
use crate::services::source::{CollegeSource, SourceError};

/// Failures the matcher does not absorb
#[derive(Debug, Error)]
pub enum MatchError {
    /// The store could not be reached at all; distinct from "no matches"
    #[error("{0}")]
    SourceUnavailable(#[from] SourceError),
}

/// Result of the matching process
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub results: ResultSet,
    /// Rows returned by the table lookup
    pub candidates: usize,
    /// Rows dropped for malformed cutoffs
    pub skipped_rows: usize,
    /// The case-insensitive place lookup was used
    pub fallback_used: bool,
    /// A lookup failed and the result was forced empty
    pub degraded: bool,
}

/// Rank-range matcher over the per-college-type cutoff tables
///
/// # Pipeline
/// 1. Resolve the college type to its table; unknown or absent → empty
/// 2. Normalize the place preference
/// 3. Primary lookup (exact place, or no place filter)
/// 4. Case-insensitive place lookup if step 3 found nothing for a named place
/// 5. Keep rows whose cutoff window contains the rank
#[derive(Debug, Clone)]
pub struct CollegeMatcher {
    normalizer: PlaceNormalizer,
    order_by_opening: bool,
}

impl CollegeMatcher {
    pub fn new(normalizer: PlaceNormalizer) -> Self {
        Self {
            normalizer,
            order_by_opening: false,
        }
    }

    /// Ask the store to return rows ordered by opening cutoff
    pub fn order_by_opening(mut self, enabled: bool) -> Self {
        self.order_by_opening = enabled;
        self
    }

    /// Find colleges whose cutoff window contains `query.rank`.
    ///
    /// `query.rank` is expected to be validated as positive by the caller.
    /// Lookup failures after the table check degrade to an empty result
    /// (flagged in the outcome); only an unreachable store is an error.
    pub async fn predict(
        &self,
        source: &dyn CollegeSource,
        query: &PredictionQuery,
    ) -> Result<MatchOutcome, MatchError> {
        let Some(college_type) = CollegeType::parse(&query.college_type) else {
            info!("Unknown college type {:?}, returning no matches", query.college_type);
            return Ok(MatchOutcome::default());
        };

        if !source.table_exists(college_type).await? {
            warn!("Table {} does not exist", college_type.table_name());
            return Ok(MatchOutcome::default());
        }

        let place = self.normalizer.normalize(&query.place);

        debug!(
            "Querying {} (state={}, exam_type={}, category={}, place={})",
            college_type.table_name(),
            query.state,
            query.exam_type,
            query.category,
            place.label()
        );

        let mut filter = CollegeFilter {
            state: query.state.clone(),
            exam_type: query.exam_type.clone(),
            category: query.category.clone(),
            place: match &place {
                PlaceFilter::Any => PlaceMatch::Any,
                PlaceFilter::Named(label) => PlaceMatch::Exact(label.clone()),
            },
            order_by_opening: self.order_by_opening,
        };

        let mut outcome = MatchOutcome::default();

        let mut rows = match source.fetch(college_type, &filter).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Database query error on {}: {}", college_type.table_name(), e);
                outcome.degraded = true;
                return Ok(outcome);
            }
        };

        if rows.is_empty() {
            if let PlaceFilter::Named(label) = &place {
                info!("No exact match for {}, trying case-insensitive search", label);
                filter.place = PlaceMatch::CaseInsensitive(label.to_lowercase());
                outcome.fallback_used = true;

                rows = match source.fetch(college_type, &filter).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        error!("Database query error on {}: {}", college_type.table_name(), e);
                        outcome.degraded = true;
                        return Ok(outcome);
                    }
                };
            }
        }

        outcome.candidates = rows.len();
        let (results, skipped_rows) = filter_by_rank(rows, query.rank);
        outcome.results = results;
        outcome.skipped_rows = skipped_rows;

        debug!(
            "Found {} exact matches in {} candidates for rank {} ({} skipped)",
            outcome.results.exact_matches.len(),
            outcome.candidates,
            query.rank,
            outcome.skipped_rows
        );

        Ok(outcome)
    }
}

impl Default for CollegeMatcher {
    fn default() -> Self {
        Self::new(PlaceNormalizer::default())
    }
}

/// Keep rows whose window contains `rank`, preserving lookup order.
/// Returns the result set and the number of malformed rows dropped.
pub fn filter_by_rank(rows: Vec<CollegeRow>, rank: i64) -> (ResultSet, usize) {
    let mut results = ResultSet::empty();
    let mut skipped = 0;

    for row in rows {
        let window = match CutoffWindow::from_row(&row) {
            Ok(window) => window,
            Err(reason) => {
                skipped += 1;
                match reason {
                    RowRejection::UnparsableCutoff => debug!(
                        "Skipping college {} due to unparsable cutoffs ({:?} - {:?})",
                        row.college_name.as_deref().unwrap_or("Unknown"),
                        row.opening_cutoff_rank,
                        row.closing_cutoff_rank
                    ),
                    RowRejection::InvertedWindow => debug!(
                        "Skipping college {} due to inverted cutoff window ({:?} - {:?})",
                        row.college_name.as_deref().unwrap_or("Unknown"),
                        row.opening_cutoff_rank,
                        row.closing_cutoff_rank
                    ),
                }
                continue;
            }
        };

        if window.contains(rank) {
            results.exact_matches.push(to_record(row, window));
        }
    }

    (results, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemorySource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_row(id: &str, place: &str, category: &str, opening: &str, closing: &str) -> CollegeRow {
        CollegeRow {
            college_id: Some(id.to_string()),
            college_name: Some(format!("College {}", id)),
            college_type: Some("MCA".to_string()),
            state: Some("Karnataka".to_string()),
            place: Some(place.to_string()),
            exam_type: Some("PGCET".to_string()),
            category: Some(category.to_string()),
            opening_cutoff_rank: Some(opening.to_string()),
            closing_cutoff_rank: Some(closing.to_string()),
            seats: Some("60".to_string()),
            year: Some("2024".to_string()),
            ..Default::default()
        }
    }

    fn create_query(place: &str, rank: i64) -> PredictionQuery {
        PredictionQuery {
            college_type: "MCA".to_string(),
            exam_type: "PGCET".to_string(),
            state: "Karnataka".to_string(),
            category: "GM".to_string(),
            place: place.to_string(),
            rank,
        }
    }

    fn ids(outcome: &MatchOutcome) -> Vec<&str> {
        outcome
            .results
            .exact_matches
            .iter()
            .map(|r| r.college_id.as_str())
            .collect()
    }

    /// Counts fetches and can fail them on demand
    struct CountingSource {
        inner: MemorySource,
        fetches: AtomicUsize,
        fail_fetch: bool,
    }

    impl CountingSource {
        fn new(inner: MemorySource) -> Self {
            Self { inner, fetches: AtomicUsize::new(0), fail_fetch: false }
        }
    }

    #[async_trait]
    impl CollegeSource for CountingSource {
        async fn table_exists(&self, college_type: CollegeType) -> Result<bool, SourceError> {
            self.inner.table_exists(college_type).await
        }

        async fn fetch(
            &self,
            college_type: CollegeType,
            filter: &CollegeFilter,
        ) -> Result<Vec<CollegeRow>, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(SourceError::Query("disk I/O error".to_string()));
            }
            self.inner.fetch(college_type, filter).await
        }

        async fn place_counts(&self, college_type: CollegeType) -> Result<Vec<crate::models::PlaceCount>, SourceError> {
            self.inner.place_counts(college_type).await
        }

        async fn health_check(&self) -> Result<bool, SourceError> {
            Ok(true)
        }
    }

    struct DownSource;

    #[async_trait]
    impl CollegeSource for DownSource {
        async fn table_exists(&self, _: CollegeType) -> Result<bool, SourceError> {
            Err(SourceError::DatabaseMissing("database/college_data.db".to_string()))
        }

        async fn fetch(&self, _: CollegeType, _: &CollegeFilter) -> Result<Vec<CollegeRow>, SourceError> {
            unreachable!("fetch must not run when the table check fails")
        }

        async fn place_counts(&self, _: CollegeType) -> Result<Vec<crate::models::PlaceCount>, SourceError> {
            unreachable!()
        }

        async fn health_check(&self) -> Result<bool, SourceError> {
            Ok(false)
        }
    }

    fn bengaluru_table() -> MemorySource {
        MemorySource::new().with_table(
            CollegeType::Mca,
            vec![
                create_row("1", "Bengaluru", "GM", "100", "500"),
                create_row("2", "Mysore", "GM", "200", "800"),
                create_row("3", "Bengaluru", "SC", "100", "5000"),
            ],
        )
    }

    #[tokio::test]
    async fn test_alias_then_rank_containment() {
        let matcher = CollegeMatcher::default();
        let source = bengaluru_table();

        let outcome = matcher.predict(&source, &create_query("bangalore", 300)).await.unwrap();

        assert_eq!(ids(&outcome), vec!["1"]);
        assert!(!outcome.fallback_used);
        assert!(outcome.results.near_matches.is_empty());
        assert!(outcome.results.weak_matches.is_empty());
    }

    #[tokio::test]
    async fn test_rank_below_window_excluded() {
        let matcher = CollegeMatcher::default();
        let source = bengaluru_table();

        let outcome = matcher.predict(&source, &create_query("bangalore", 50)).await.unwrap();

        assert!(outcome.results.exact_matches.is_empty());
        assert_eq!(outcome.candidates, 1);
    }

    #[tokio::test]
    async fn test_all_and_empty_place_skip_place_filter() {
        let matcher = CollegeMatcher::default();
        let source = bengaluru_table();

        for place in ["all", "ALL", "", "  "] {
            let outcome = matcher.predict(&source, &create_query(place, 300)).await.unwrap();
            assert_eq!(ids(&outcome), vec!["1", "2"], "place {:?}", place);
            assert!(!outcome.fallback_used);
        }
    }

    #[tokio::test]
    async fn test_case_insensitive_fallback() {
        let matcher = CollegeMatcher::default();
        let source = CountingSource::new(bengaluru_table());

        let outcome = matcher.predict(&source, &create_query("MYSORE ", 300)).await.unwrap();

        // "mysore" is an alias, so the exact lookup already hits
        assert_eq!(ids(&outcome), vec!["2"]);
        assert!(!outcome.fallback_used);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        let source = CountingSource::new(MemorySource::new().with_table(
            CollegeType::Mca,
            vec![create_row("9", "TUMAKURU", "GM", "1", "1000")],
        ));
        let outcome = matcher.predict(&source, &create_query("Tumakuru", 300)).await.unwrap();

        assert_eq!(ids(&outcome), vec!["9"]);
        assert!(outcome.fallback_used);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_only_on_empty_named_lookup() {
        let matcher = CollegeMatcher::default();

        // Primary lookup finds a row outside the rank window: no fallback
        let source = CountingSource::new(bengaluru_table());
        let outcome = matcher.predict(&source, &create_query("Bengaluru", 9000)).await.unwrap();
        assert!(outcome.results.exact_matches.is_empty());
        assert!(!outcome.fallback_used);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        // No place filter and nothing found: no fallback
        let source = CountingSource::new(MemorySource::new().with_table(CollegeType::Mca, vec![]));
        let outcome = matcher.predict(&source, &create_query("all", 300)).await.unwrap();
        assert!(!outcome.fallback_used);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_with_no_rows_anywhere() {
        let matcher = CollegeMatcher::default();
        let source = CountingSource::new(bengaluru_table());

        let mut query = create_query("BENGALURU", 300);
        query.exam_type = "KCET".to_string();

        let outcome = matcher.predict(&source, &query).await.unwrap();
        assert!(outcome.fallback_used);
        assert!(outcome.results.is_empty());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() {
        let matcher = CollegeMatcher::default();
        let source = MemorySource::new().with_table(
            CollegeType::Mca,
            vec![
                create_row("1", "Bengaluru", "GM", "100", "N/A"),
                create_row("2", "Bengaluru", "GM", "800", "100"),
                create_row("3", "Bengaluru", "GM", "100.0", "500"),
            ],
        );

        let outcome = matcher.predict(&source, &create_query("Bengaluru", 300)).await.unwrap();

        assert_eq!(ids(&outcome), vec!["3"]);
        assert_eq!(outcome.skipped_rows, 2);
        assert_eq!(outcome.candidates, 3);
    }

    #[tokio::test]
    async fn test_unknown_college_type_is_empty() {
        let matcher = CollegeMatcher::default();
        let source = CountingSource::new(bengaluru_table());

        let mut query = create_query("all", 300);
        query.college_type = "BTECH".to_string();

        let outcome = matcher.predict(&source, &query).await.unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_table_is_empty() {
        let matcher = CollegeMatcher::default();
        let source = bengaluru_table();

        let mut query = create_query("all", 300);
        query.college_type = "mba".to_string();

        let outcome = matcher.predict(&source, &query).await.unwrap();
        assert!(outcome.results.is_empty());
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn test_query_failure_degrades_to_empty() {
        let matcher = CollegeMatcher::default();
        let mut source = CountingSource::new(bengaluru_table());
        source.fail_fetch = true;

        let outcome = matcher.predict(&source, &create_query("Bengaluru", 300)).await.unwrap();
        assert!(outcome.degraded);
        assert!(outcome.results.is_empty());
        // No fallback after a failed primary lookup
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_source_is_an_error() {
        let matcher = CollegeMatcher::default();
        let result = matcher.predict(&DownSource, &create_query("all", 300)).await;
        assert!(matches!(result, Err(MatchError::SourceUnavailable(SourceError::DatabaseMissing(_)))));
    }

    #[test]
    fn test_filter_by_rank_preserves_order() {
        let rows = vec![
            create_row("b", "Mysore", "GM", "10", "400"),
            create_row("a", "Mysore", "GM", "1", "300"),
            create_row("c", "Mysore", "GM", "301", "900"),
        ];

        let (results, skipped) = filter_by_rank(rows, 300);
        let ids: Vec<_> = results.exact_matches.iter().map(|r| r.college_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(skipped, 0);
    }
}
