// Core algorithm exports
pub mod filters;
pub mod matcher;
pub mod place;

pub use filters::{parse_cutoff, CutoffWindow, RowRejection};
pub use matcher::{filter_by_rank, CollegeMatcher, MatchError, MatchOutcome};
pub use place::PlaceNormalizer;
