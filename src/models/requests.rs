use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::domain::PredictionQuery;

/// Request to predict colleges for a rank
///
/// Every field is optional on the wire; absent fields take the defaults the
/// prediction form has always used.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictRequest {
    #[serde(default = "default_exam_type")]
    pub exam_type: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default = "default_place")]
    pub place: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_college_type")]
    pub college_type: String,
    #[validate(range(min = 1, message = "Please enter a valid rank"))]
    #[serde(default, deserialize_with = "deserialize_rank")]
    pub rank: i64,
}

impl PredictRequest {
    pub fn into_query(self) -> PredictionQuery {
        PredictionQuery {
            college_type: self.college_type,
            exam_type: self.exam_type,
            state: self.state,
            category: self.category,
            place: self.place,
            rank: self.rank,
        }
    }
}

fn default_exam_type() -> String {
    "PGCET".to_string()
}

fn default_state() -> String {
    "Karnataka".to_string()
}

fn default_place() -> String {
    "All".to_string()
}

fn default_category() -> String {
    "GM".to_string()
}

fn default_college_type() -> String {
    "MCA".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RankInput {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accepts `300`, `300.0` or `"300"`; form posts often send the rank as text.
fn deserialize_rank<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RankInput::deserialize(deserializer)? {
        RankInput::Int(rank) => Ok(rank),
        RankInput::Float(rank) if rank.is_finite() => Ok(rank.trunc() as i64),
        RankInput::Float(rank) => Err(serde::de::Error::custom(format!("invalid rank: {}", rank))),
        RankInput::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid rank: {:?}", text))),
    }
}

/// Query string for the places listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesQuery {
    #[serde(default = "default_college_type")]
    pub college_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let req: PredictRequest = serde_json::from_str(r#"{"rank": 300}"#).unwrap();
        assert_eq!(req.exam_type, "PGCET");
        assert_eq!(req.state, "Karnataka");
        assert_eq!(req.place, "All");
        assert_eq!(req.category, "GM");
        assert_eq!(req.college_type, "MCA");
        assert_eq!(req.rank, 300);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rank_accepts_numeric_string() {
        let req: PredictRequest = serde_json::from_str(r#"{"rank": " 1200 "}"#).unwrap();
        assert_eq!(req.rank, 1200);
    }

    #[test]
    fn test_rank_rejects_garbage() {
        let result: Result<PredictRequest, _> = serde_json::from_str(r#"{"rank": "first"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_rank_fails_validation() {
        let req: PredictRequest = serde_json::from_str(r#"{"place": "bangalore"}"#).unwrap();
        assert_eq!(req.rank, 0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_negative_rank_fails_validation() {
        let req: PredictRequest = serde_json::from_str(r#"{"rank": -5}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
