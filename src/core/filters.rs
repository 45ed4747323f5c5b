use crate::models::{CollegeRecord, CollegeRow};

/// Why a row could not take part in rank matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    /// Opening or closing cutoff missing or not a number
    UnparsableCutoff,
    /// Opening cutoff larger than closing cutoff
    InvertedWindow,
}

/// Inclusive `[opening, closing]` admission window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffWindow {
    pub opening: i64,
    pub closing: i64,
}

impl CutoffWindow {
    /// Parse both cutoff cells of a row.
    ///
    /// Inverted windows are rejected: no rank can satisfy them, and keeping
    /// them would only hide bad data.
    pub fn from_row(row: &CollegeRow) -> Result<Self, RowRejection> {
        let opening = parse_cutoff(row.opening_cutoff_rank.as_deref())
            .ok_or(RowRejection::UnparsableCutoff)?;
        let closing = parse_cutoff(row.closing_cutoff_rank.as_deref())
            .ok_or(RowRejection::UnparsableCutoff)?;

        if opening > closing {
            return Err(RowRejection::InvertedWindow);
        }

        Ok(Self { opening, closing })
    }

    /// Inclusive on both ends
    #[inline]
    pub fn contains(&self, rank: i64) -> bool {
        self.opening <= rank && rank <= self.closing
    }
}

/// Interpret a cutoff cell as an integer rank.
///
/// Integers parse directly. Reals (how SQLite hands back a numeric column
/// that once held a NULL) truncate toward zero. Anything else is `None`.
pub fn parse_cutoff(raw: Option<&str>) -> Option<i64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }

    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => Some(value.trunc() as i64),
        _ => None,
    }
}

/// Lenient parse for the optional integer metadata columns
fn parse_optional_int(raw: Option<&str>) -> Option<i64> {
    parse_cutoff(raw)
}

/// Build the outward record for a row whose window has been parsed
pub fn to_record(row: CollegeRow, window: CutoffWindow) -> CollegeRecord {
    CollegeRecord {
        serial_no: parse_optional_int(row.serial_no.as_deref()),
        college_id: row.college_id.unwrap_or_default(),
        college_name: row.college_name.unwrap_or_default(),
        college_type: row.college_type.unwrap_or_default(),
        state: row.state.unwrap_or_default(),
        place: row.place.unwrap_or_default(),
        exam_type: row.exam_type.unwrap_or_default(),
        category: row.category.unwrap_or_default(),
        opening_cutoff_rank: window.opening,
        closing_cutoff_rank: window.closing,
        seats: parse_optional_int(row.seats.as_deref()),
        year: parse_optional_int(row.year.as_deref()),
        website: row.website,
        background_images: row.background_images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_cutoffs(opening: Option<&str>, closing: Option<&str>) -> CollegeRow {
        CollegeRow {
            college_id: Some("C001".to_string()),
            college_name: Some("Test College".to_string()),
            opening_cutoff_rank: opening.map(str::to_string),
            closing_cutoff_rank: closing.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_cutoff_variants() {
        assert_eq!(parse_cutoff(Some("100")), Some(100));
        assert_eq!(parse_cutoff(Some(" 250 ")), Some(250));
        assert_eq!(parse_cutoff(Some("100.0")), Some(100));
        assert_eq!(parse_cutoff(Some("99.9")), Some(99));
        assert_eq!(parse_cutoff(Some("N/A")), None);
        assert_eq!(parse_cutoff(Some("")), None);
        assert_eq!(parse_cutoff(Some("NaN")), None);
        assert_eq!(parse_cutoff(None), None);
    }

    #[test]
    fn test_window_inclusive_bounds() {
        let window = CutoffWindow { opening: 100, closing: 500 };
        assert!(window.contains(100));
        assert!(window.contains(300));
        assert!(window.contains(500));
        assert!(!window.contains(99));
        assert!(!window.contains(501));
    }

    #[test]
    fn test_single_rank_window() {
        let window = CutoffWindow { opening: 42, closing: 42 };
        assert!(window.contains(42));
        assert!(!window.contains(41));
    }

    #[test]
    fn test_from_row_rejects_non_numeric() {
        let row = row_with_cutoffs(Some("100"), Some("N/A"));
        assert_eq!(CutoffWindow::from_row(&row), Err(RowRejection::UnparsableCutoff));

        let row = row_with_cutoffs(None, Some("500"));
        assert_eq!(CutoffWindow::from_row(&row), Err(RowRejection::UnparsableCutoff));
    }

    #[test]
    fn test_from_row_rejects_inverted_window() {
        let row = row_with_cutoffs(Some("500"), Some("100"));
        assert_eq!(CutoffWindow::from_row(&row), Err(RowRejection::InvertedWindow));
    }

    #[test]
    fn test_to_record_carries_metadata() {
        let mut row = row_with_cutoffs(Some("100"), Some("500"));
        row.seats = Some("60".to_string());
        row.year = Some("2024".to_string());
        row.website = Some("https://example.edu".to_string());

        let window = CutoffWindow::from_row(&row).unwrap();
        let record = to_record(row, window);

        assert_eq!(record.college_id, "C001");
        assert_eq!(record.opening_cutoff_rank, 100);
        assert_eq!(record.closing_cutoff_rank, 500);
        assert_eq!(record.seats, Some(60));
        assert_eq!(record.year, Some(2024));
        assert_eq!(record.website.as_deref(), Some("https://example.edu"));
        assert_eq!(record.place, "");
    }
}
