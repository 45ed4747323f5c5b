use serde::{Deserialize, Serialize};

/// Program category; selects which cutoff table is queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CollegeType {
    Mca,
    Mba,
    Mtech,
}

impl CollegeType {
    pub const ALL: [CollegeType; 3] = [CollegeType::Mca, CollegeType::Mba, CollegeType::Mtech];

    /// Resolve a user-supplied college type, case-insensitively.
    ///
    /// Returns `None` for anything outside the fixed set; callers treat that
    /// as "no data" rather than an error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "mca" => Some(CollegeType::Mca),
            "mba" => Some(CollegeType::Mba),
            "mtech" => Some(CollegeType::Mtech),
            _ => None,
        }
    }

    /// Statically known table identifier for this college type
    pub fn table_name(self) -> &'static str {
        match self {
            CollegeType::Mca => "mca_colleges",
            CollegeType::Mba => "mba_colleges",
            CollegeType::Mtech => "mtech_colleges",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollegeType::Mca => "MCA",
            CollegeType::Mba => "MBA",
            CollegeType::Mtech => "MTECH",
        }
    }
}

impl std::fmt::Display for CollegeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw row from a cutoff table.
///
/// Every cell is read as text: SQLite does not enforce column types, so a
/// column declared INTEGER may hold `"N/A"` or be NULL. Interpreting the
/// cutoff cells is left to the matcher.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct CollegeRow {
    pub serial_no: Option<String>,
    pub college_id: Option<String>,
    pub college_name: Option<String>,
    pub college_type: Option<String>,
    pub state: Option<String>,
    pub place: Option<String>,
    pub exam_type: Option<String>,
    pub category: Option<String>,
    pub opening_cutoff_rank: Option<String>,
    pub closing_cutoff_rank: Option<String>,
    pub seats: Option<String>,
    pub year: Option<String>,
    pub website: Option<String>,
    pub background_images: Option<String>,
}

/// A college whose cutoff window was successfully parsed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeRecord {
    pub serial_no: Option<i64>,
    pub college_id: String,
    pub college_name: String,
    pub college_type: String,
    pub state: String,
    pub place: String,
    pub exam_type: String,
    pub category: String,
    pub opening_cutoff_rank: i64,
    pub closing_cutoff_rank: i64,
    pub seats: Option<i64>,
    pub year: Option<i64>,
    pub website: Option<String>,
    pub background_images: Option<String>,
}

/// Normalized location preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceFilter {
    /// No location restriction
    Any,
    /// A canonical (or passed-through) place label
    Named(String),
}

impl PlaceFilter {
    pub const ANY_LABEL: &'static str = "All";

    /// Canonical string form; `"All"` when no place filter applies
    pub fn label(&self) -> &str {
        match self {
            PlaceFilter::Any => Self::ANY_LABEL,
            PlaceFilter::Named(place) => place,
        }
    }
}

/// How the place column is compared in a table lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceMatch {
    Any,
    /// Case-sensitive equality
    Exact(String),
    /// `LOWER(place)` equality; the value is already lower-cased
    CaseInsensitive(String),
}

/// Equality filters for one table lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollegeFilter {
    pub state: String,
    pub exam_type: String,
    pub category: String,
    pub place: PlaceMatch,
    pub order_by_opening: bool,
}

/// Distinct place label with the number of rows carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaceCount {
    pub place: String,
    pub college_count: i64,
}

/// Parsed prediction request, as handed to the matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionQuery {
    pub college_type: String,
    pub exam_type: String,
    pub state: String,
    pub category: String,
    pub place: String,
    pub rank: i64,
}

/// Matches grouped by confidence.
///
/// Only `exact_matches` is ever filled; the other two buckets are kept empty
/// so the response shape stays stable for existing clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub exact_matches: Vec<CollegeRecord>,
    pub near_matches: Vec<CollegeRecord>,
    pub weak_matches: Vec<CollegeRecord>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.exact_matches.is_empty() && self.near_matches.is_empty() && self.weak_matches.is_empty()
    }
}
